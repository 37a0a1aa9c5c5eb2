use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and the small text fields next to the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Request body cap for uploads. Saturates for limits beyond the address space.
fn body_limit(max_upload_size: u64) -> usize {
    usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = body_limit(state.config.max_upload_size);

    Router::new()
        // Files
        .route("/files", get(handlers::list_files))
        .route(
            "/files",
            post(handlers::create_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/:id", get(handlers::get_file))
        .route("/files/:id", patch(handlers::update_file))
        .route("/files/:id", delete(handlers::purge_file))
        .route("/files/:id/content", get(handlers::file_content))
        .route("/files/:id/preview", get(handlers::file_preview))
        .route("/files/:id/favorite", post(handlers::favorite_file))
        .route("/files/:id/trash", post(handlers::trash_file))
        .route("/files/:id/restore", post(handlers::restore_file))
        // Trash
        .route("/trash", get(handlers::list_trash))
        .route("/trash", delete(handlers::purge_all))
        .route("/trash/restore", post(handlers::restore_all))
        // Folders
        .route("/folders", get(handlers::list_folders))
        .route("/folders", post(handlers::create_folder))
        .route("/folders/:id", get(handlers::get_folder))
        .route("/folders/:id", delete(handlers::delete_folder))
        // Analytics
        .route("/storage", get(handlers::storage_stats))
        // Workspace
        .route("/workspace/files", get(handlers::workspace_files))
        .route("/workspace/files/:id/favorite", post(handlers::workspace_favorite))
        .route("/workspace/files/:id/trash", post(handlers::workspace_trash))
        .route("/workspace/sort", post(handlers::sort))
        .route("/workspace/favorites", post(handlers::toggle_favorites_only))
        .route("/workspace/search", put(handlers::search))
        .route("/workspace/selection", delete(handlers::clear_selection))
        .route("/workspace/selection/all", post(handlers::toggle_select_all))
        .route("/workspace/selection/:id", post(handlers::toggle_selection))
        .route("/workspace/batch/share", get(handlers::share_selection))
        .route("/workspace/batch/:action", post(handlers::run_batch))
        .route("/workspace/notice", get(handlers::take_notice))
        // Session
        .route("/session", get(handlers::current_user))
        .route("/session/sign-out", post(handlers::sign_out))
        // Blob content (local backend)
        .route("/blobs/*key", get(handlers::serve_blob))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_leaves_room_for_multipart_fields() {
        assert_eq!(body_limit(1_000_000), 1_000_000 + MULTIPART_OVERHEAD);
        assert_eq!(body_limit(u64::MAX), usize::MAX);
        assert_eq!(body_limit(usize::MAX as u64 - 1), usize::MAX);
    }
}
