use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use super::static_files::content_response;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::files::{FileEdit, NewUpload};
use crate::preview::Preview;
use crate::session::SessionUser;
use crate::storage::models::{FileRecord, LifecycleState, Patch};
use crate::view::{SortKey, SortOrder, ViewSettings};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub blob_ref: String,
    pub created_at: String,
    pub file_type: String,
    pub id: String,
    pub is_favorite: bool,
    pub is_in_trash: bool,
    pub modified_at: Option<String>,
    pub name: String,
    pub owner_email: String,
    pub parent_folder_id: Option<String>,
    pub size: u64,
    pub state: LifecycleState,
    pub trashed_at: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateFileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_folder_id: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub favorites_only: bool,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

/// Distinguishes between a missing field (`None`) and an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let files = state
        .services
        .files
        .list_active(&user.email, params.folder_id.as_deref())
        .await?;

    let view = ViewSettings {
        search: params.search,
        favorites_only: params.favorites_only,
        sort: params.sort,
        order: params.order,
    };

    Ok(JSend::success(
        view.apply(&files).iter().map(file_to_response).collect(),
    ))
}

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    mut multipart: Multipart,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut folder_id: Option<String> = None;
    let mut modified_at: Option<i64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        ApiError::payload_too_large("File is too large")
                    } else {
                        ApiError::bad_request(format!("Failed to read file: {e}"))
                    }
                })?;
                file_data = Some(data);
            }
            "folder_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid folder_id: {e}")))?;
                folder_id = Some(text).filter(|t| !t.trim().is_empty());
            }
            "modified_at" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid modified_at: {e}")))?;
                modified_at = Some(text.trim().parse().map_err(|_| {
                    ApiError::bad_request("modified_at must be milliseconds since the epoch")
                })?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or_else(|| ApiError::bad_request("file field is required"))?;
    let name = file_name.ok_or_else(|| ApiError::bad_request("file must have a file name"))?;
    let modified_at = match modified_at {
        Some(ms) => Some(
            Utc.timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| ApiError::bad_request("modified_at is out of range"))?,
        ),
        None => None,
    };

    let upload = NewUpload {
        name: name.clone(),
        data,
        parent_folder_id: folder_id,
        modified_at,
    };
    let report = |percent: u8| tracing::trace!(name = %name, percent, "Upload progress");
    let file = state
        .services
        .files
        .upload(&user.email, upload, &report)
        .await?;

    Ok(JSend::success(file_to_response(&file)))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = state.services.files.get_owned(&user.email, &id).await?;
    Ok(JSend::success(file_to_response(&file)))
}

pub async fn update_file(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateFileRequest>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    if req.name.is_none() && req.parent_folder_id.is_none() {
        return Err(ApiError::bad_request(
            "at least one field (name, parent_folder_id) must be provided",
        ));
    }

    let edit = FileEdit {
        name: req.name,
        parent_folder_id: Patch::from(req.parent_folder_id),
    };
    let file = state.services.files.edit(&user.email, &id, edit).await?;
    Ok(JSend::success(file_to_response(&file)))
}

pub async fn file_content(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (file, data) = state.services.files.content(&user.email, &id).await?;
    Ok(content_response(data, &file.name, "attachment"))
}

pub async fn file_preview(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<Preview>>, ApiError> {
    let file = state.services.files.get_owned(&user.email, &id).await?;
    Ok(JSend::success(Preview::for_file(&file)))
}

pub async fn favorite_file(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = state.services.files.get_owned(&user.email, &id).await?;
    let file = state.services.lifecycle.toggle_favorite(&file).await?;
    Ok(JSend::success(file_to_response(&file)))
}

pub async fn trash_file(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = state.services.files.get_owned(&user.email, &id).await?;
    let file = state.services.lifecycle.move_to_trash(&file).await?;
    Ok(JSend::success(file_to_response(&file)))
}

pub async fn restore_file(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = state.services.files.get_owned(&user.email, &id).await?;
    let file = state.services.lifecycle.restore(&file).await?;
    Ok(JSend::success(file_to_response(&file)))
}

/// Permanently delete a trashed file.
pub async fn purge_file(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    let file = state.services.files.get_owned(&user.email, &id).await?;
    state.services.lifecycle.purge(&file).await?;
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

pub(super) fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        blob_ref: file.blob_ref.clone(),
        created_at: file.created_at.to_rfc3339(),
        file_type: file.file_type.clone(),
        id: file.id.clone(),
        is_favorite: file.is_favorite,
        is_in_trash: file.is_in_trash,
        modified_at: file.modified_at.map(|t| t.to_rfc3339()),
        name: file.name.clone(),
        owner_email: file.owner_email.clone(),
        parent_folder_id: file.parent_folder_id.clone(),
        size: file.size,
        state: file.state(),
        trashed_at: file.trashed_at.map(|t| t.to_rfc3339()),
    }
}
