use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::folders::CascadeStats;
use crate::session::SessionUser;
use crate::storage::models::FolderRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub created_at: String,
    pub id: String,
    pub name: String,
    pub owner_email: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateFolderRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFoldersParams {
    #[serde(default)]
    pub parent_id: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    AppJson(req): AppJson<CreateFolderRequest>,
) -> Result<Json<JSend<FolderResponse>>, ApiError> {
    let folder = state
        .services
        .folders
        .create_folder(&user.email, &req.name, req.parent_id.as_deref())
        .await?;
    Ok(JSend::success(folder_to_response(&folder)))
}

pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    AppQuery(params): AppQuery<ListFoldersParams>,
) -> Result<Json<JSend<Vec<FolderResponse>>>, ApiError> {
    let folders = state
        .services
        .folders
        .list_folders(&user.email, params.parent_id.as_deref())
        .await?;
    Ok(JSend::success(folders.iter().map(folder_to_response).collect()))
}

pub async fn get_folder(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FolderResponse>>, ApiError> {
    let folder = state.services.folders.get_owned(&user.email, &id).await?;
    Ok(JSend::success(folder_to_response(&folder)))
}

/// Delete a folder with all of its subfolders and files. Files are purged, not trashed.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<CascadeStats>>, ApiError> {
    state.services.folders.get_owned(&user.email, &id).await?;
    let stats = state.services.folders.delete_cascade(&id).await?;
    Ok(JSend::success(stats))
}

fn folder_to_response(folder: &FolderRecord) -> FolderResponse {
    FolderResponse {
        created_at: folder.created_at.to_rfc3339(),
        id: folder.id.clone(),
        name: folder.name.clone(),
        owner_email: folder.owner_email.clone(),
        parent_id: folder.parent_folder_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_state, OWNER};
    use axum::http::StatusCode;

    fn user(email: &str) -> SessionUser {
        SessionUser {
            email: email.to_string(),
            display_name: None,
            avatar_url: None,
        }
    }

    fn create(name: &str, parent_id: Option<&str>) -> AppJson<CreateFolderRequest> {
        AppJson(CreateFolderRequest {
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn folders_are_listed_per_parent() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let docs = create_folder(State(state.clone()), user(OWNER), create("Docs", None))
            .await
            .unwrap()
            .0
            .data;
        let nested_folder =
            create_folder(State(state.clone()), user(OWNER), create("2024", Some(&docs.id)))
                .await
                .unwrap();
        assert_eq!(nested_folder.0.data.name, "2024");

        let root = list_folders(
            State(state.clone()),
            user(OWNER),
            AppQuery(ListFoldersParams::default()),
        )
        .await
        .unwrap();
        assert_eq!(root.0.data.len(), 1);
        assert_eq!(root.0.data[0].name, "Docs");

        let nested = list_folders(
            State(state.clone()),
            user(OWNER),
            AppQuery(ListFoldersParams {
                parent_id: Some(docs.id.clone()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(nested.0.data[0].parent_id.as_deref(), Some(docs.id.as_str()));
    }

    #[tokio::test]
    async fn other_users_cannot_delete_folder() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let docs = create_folder(State(state.clone()), user(OWNER), create("Docs", None))
            .await
            .unwrap()
            .0
            .data;

        let err = delete_folder(
            State(state.clone()),
            user("intruder@example.com"),
            Path(docs.id.clone()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Fail(StatusCode::NOT_FOUND, _)));

        let stats = delete_folder(State(state.clone()), user(OWNER), Path(docs.id.clone()))
            .await
            .unwrap();
        assert_eq!(stats.0.data, CascadeStats { folders: 1, files: 0 });
    }
}
