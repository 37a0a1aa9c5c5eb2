//! Session-scoped listing endpoints. Selection, view settings and notices persist
//! between requests of the same user until sign-out.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::files::{file_to_response, FileResponse};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::batch::{BatchAction, BatchOutcome};
use crate::session::SessionUser;
use crate::view::{SortKey, ViewSettings};
use crate::workspace::{Notice, Workspace};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct WorkspaceResponse {
    pub files: Vec<FileResponse>,
    pub folder_id: Option<String>,
    pub selected: Vec<String>,
    pub view: ViewSettings,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selected: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub links: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkspaceParams {
    #[serde(default)]
    pub folder_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SortRequest {
    pub key: SortKey,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

fn selection_of(ws: &Workspace) -> Vec<String> {
    ws.selection.ids().map(str::to_string).collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// Reload the listing for a folder and return what the user sees.
pub async fn workspace_files(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    AppQuery(params): AppQuery<WorkspaceParams>,
) -> Result<Json<JSend<WorkspaceResponse>>, ApiError> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;

    if let Err(e) = ws
        .refresh(&state.services.files, &user.email, params.folder_id.as_deref())
        .await
    {
        ws.error("Error loading files");
        return Err(e.into());
    }

    Ok(JSend::success(WorkspaceResponse {
        files: ws.visible().iter().map(file_to_response).collect(),
        folder_id: ws.folder_id.clone(),
        selected: selection_of(&ws),
        view: ws.view.clone(),
    }))
}

pub async fn sort(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    AppJson(req): AppJson<SortRequest>,
) -> Json<JSend<ViewSettings>> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    ws.view.sort_by(req.key);
    JSend::success(ws.view.clone())
}

pub async fn toggle_favorites_only(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Json<JSend<ViewSettings>> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    ws.view.toggle_favorites_only();
    JSend::success(ws.view.clone())
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    AppJson(req): AppJson<SearchRequest>,
) -> Json<JSend<ViewSettings>> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    ws.view.search = req.query;
    JSend::success(ws.view.clone())
}

pub async fn toggle_selection(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Json<JSend<SelectionResponse>> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    ws.selection.toggle(&id);
    JSend::success(SelectionResponse {
        selected: selection_of(&ws),
    })
}

/// Select every visible file, or clear the selection if that is already the case.
pub async fn toggle_select_all(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Json<JSend<SelectionResponse>> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    ws.toggle_select_all();
    JSend::success(SelectionResponse {
        selected: selection_of(&ws),
    })
}

pub async fn clear_selection(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Json<JSend<SelectionResponse>> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    ws.selection.clear();
    JSend::success(SelectionResponse {
        selected: Vec::new(),
    })
}

/// Apply trash, restore or purge to every selected file.
/// Route: POST /workspace/batch/:action
pub async fn run_batch(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(action): Path<BatchAction>,
) -> Result<Json<JSend<BatchOutcome>>, ApiError> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    if ws.selection.is_empty() {
        return Err(ApiError::bad_request("no files selected"));
    }

    // Selected ids may be stale; only the user's own files are acted on
    let owned = state.services.files.list_all(&user.email).await?;
    let foreign: Vec<String> = ws
        .selection
        .ids()
        .filter(|id| !owned.iter().any(|f| f.id == *id))
        .map(str::to_string)
        .collect();
    for id in &foreign {
        ws.selection.deselect(id);
    }

    let mut outcome = ws.run_batch(&state.services.batch, action).await;
    if !foreign.is_empty() {
        outcome.failed += foreign.len();
        ws.error(format!("{} selected files could not be found", foreign.len()));
    }
    Ok(JSend::success(outcome))
}

pub async fn share_selection(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Json<JSend<ShareResponse>> {
    let ws = state.workspace(&user.email).await;
    let ws = ws.lock().await;
    JSend::success(ShareResponse { links: ws.share() })
}

pub async fn favorite(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    let file = ws.toggle_favorite(&state.services.lifecycle, &id).await?;
    Ok(JSend::success(file_to_response(&file)))
}

pub async fn trash(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    let file = ws.move_to_trash(&state.services.lifecycle, &id).await?;
    Ok(JSend::success(file_to_response(&file)))
}

/// The pending notice, consumed by reading it.
pub async fn take_notice(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Json<JSend<Option<Notice>>> {
    let ws = state.workspace(&user.email).await;
    let mut ws = ws.lock().await;
    JSend::success(ws.take_notice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::NewUpload;
    use crate::object_store::no_progress;
    use crate::testutil::{test_state, OWNER};
    use crate::view::SortOrder;
    use crate::workspace::NoticeLevel;
    use bytes::Bytes;

    fn owner() -> SessionUser {
        SessionUser {
            email: OWNER.to_string(),
            display_name: None,
            avatar_url: None,
        }
    }

    async fn seed(state: &AppState, names: &[&str]) {
        for name in names {
            let upload = NewUpload {
                name: name.to_string(),
                data: Bytes::from_static(b"data"),
                parent_folder_id: None,
                modified_at: None,
            };
            state
                .services
                .files
                .upload(OWNER, upload, &no_progress)
                .await
                .unwrap();
        }
    }

    async fn load(state: &Arc<AppState>) -> WorkspaceResponse {
        workspace_files(
            State(state.clone()),
            owner(),
            AppQuery(WorkspaceParams::default()),
        )
        .await
        .unwrap()
        .0
        .data
    }

    #[tokio::test]
    async fn sort_and_search_shape_the_listing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        seed(&state, &["b.txt", "a.txt", "report.pdf"]).await;

        let view = sort(
            State(state.clone()),
            owner(),
            AppJson(SortRequest { key: SortKey::Name }),
        )
        .await
        .0
        .data;
        assert_eq!(view.order, SortOrder::Desc);
        let names: Vec<String> = load(&state).await.files.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["report.pdf", "b.txt", "a.txt"]);

        let view = search(
            State(state.clone()),
            owner(),
            AppJson(SearchRequest {
                query: "TXT".to_string(),
            }),
        )
        .await
        .0
        .data;
        assert_eq!(view.search, "TXT");
        assert_eq!(load(&state).await.files.len(), 2);
    }

    #[tokio::test]
    async fn batch_trash_over_selection() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        seed(&state, &["a.txt", "b.txt", "c.txt"]).await;
        let files = load(&state).await.files;

        let mut selected = Vec::new();
        for id in [files[0].id.as_str(), files[1].id.as_str(), "not-mine"] {
            selected = toggle_selection(State(state.clone()), owner(), Path(id.to_string()))
                .await
                .0
                .data
                .selected;
        }
        assert_eq!(selected.len(), 3);
        assert!(selected.contains(&"not-mine".to_string()));

        let outcome = run_batch(State(state.clone()), owner(), Path(BatchAction::Trash))
            .await
            .unwrap()
            .0
            .data;
        assert_eq!(outcome, BatchOutcome { succeeded: 2, failed: 1 });

        let after = load(&state).await;
        assert_eq!(after.files.len(), 1);
        assert!(after.selected.is_empty());

        let notice = take_notice(State(state.clone()), owner()).await.0.data;
        assert_eq!(notice.unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        assert!(
            run_batch(State(state.clone()), owner(), Path(BatchAction::Purge))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn select_all_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        seed(&state, &["a.txt", "b.txt"]).await;
        load(&state).await;

        let all = toggle_select_all(State(state.clone()), owner()).await.0.data;
        assert_eq!(all.selected.len(), 2);
        let none = toggle_select_all(State(state.clone()), owner()).await.0.data;
        assert!(none.selected.is_empty());
    }
}
