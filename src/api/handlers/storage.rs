use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::analytics::StorageStats;
use crate::api::response::{ApiError, JSend};
use crate::session::SessionUser;
use crate::AppState;

/// Usage against the quota, broken down by category, type and upload month.
/// Trashed files count towards usage until purged.
pub async fn storage_stats(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Result<Json<JSend<StorageStats>>, ApiError> {
    let files = state.services.files.list_all(&user.email).await?;
    let folders = state.services.folders.count_owned(&user.email).await?;

    Ok(JSend::success(StorageStats::compute(
        &files,
        folders,
        state.config.storage_quota,
    )))
}
