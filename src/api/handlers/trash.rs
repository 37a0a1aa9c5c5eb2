use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use super::files::{file_to_response, FileResponse};
use crate::api::response::{ApiError, JSend};
use crate::batch::BatchOutcome;
use crate::session::SessionUser;
use crate::AppState;

/// Trashed files, most recently trashed first.
pub async fn list_trash(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let files = state.services.files.list_trash(&user.email).await?;
    Ok(JSend::success(files.iter().map(file_to_response).collect()))
}

pub async fn restore_all(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Result<Json<JSend<BatchOutcome>>, ApiError> {
    let files = state.services.files.list_trash(&user.email).await?;
    let outcome = state
        .services
        .batch
        .batch_restore(files.iter().map(|f| f.id.as_str()))
        .await;
    Ok(JSend::success(outcome))
}

/// Empty the trash.
pub async fn purge_all(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Result<Json<JSend<BatchOutcome>>, ApiError> {
    let files = state.services.files.list_trash(&user.email).await?;
    let outcome = state
        .services
        .batch
        .batch_purge(files.iter().map(|f| f.id.as_str()))
        .await;
    Ok(JSend::success(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::NewUpload;
    use crate::object_store::no_progress;
    use crate::testutil::{test_state, OWNER};
    use bytes::Bytes;

    fn owner() -> SessionUser {
        SessionUser {
            email: OWNER.to_string(),
            display_name: None,
            avatar_url: None,
        }
    }

    async fn trashed_upload(state: &AppState, owner_email: &str, name: &str) {
        let upload = NewUpload {
            name: name.to_string(),
            data: Bytes::from_static(b"data"),
            parent_folder_id: None,
            modified_at: None,
        };
        let file = state
            .services
            .files
            .upload(owner_email, upload, &no_progress)
            .await
            .unwrap();
        state.services.lifecycle.move_to_trash(&file).await.unwrap();
    }

    #[tokio::test]
    async fn restore_all_only_touches_own_trash() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        trashed_upload(&state, OWNER, "a.txt").await;
        trashed_upload(&state, OWNER, "b.txt").await;
        trashed_upload(&state, "other@example.com", "c.txt").await;

        let outcome = restore_all(State(state.clone()), owner()).await.unwrap();
        assert_eq!(outcome.0.data, BatchOutcome { succeeded: 2, failed: 0 });

        let trash = list_trash(State(state.clone()), owner()).await.unwrap();
        assert!(trash.0.data.is_empty());
        let theirs = state
            .services
            .files
            .list_trash("other@example.com")
            .await
            .unwrap();
        assert_eq!(theirs.len(), 1);
    }

    #[tokio::test]
    async fn purge_all_empties_trash() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        trashed_upload(&state, OWNER, "a.txt").await;

        let outcome = purge_all(State(state.clone()), owner()).await.unwrap();
        assert_eq!(outcome.0.data.succeeded, 1);
        assert!(state.services.files.list_all(OWNER).await.unwrap().is_empty());
    }
}
