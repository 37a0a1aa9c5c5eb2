use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::JSend;
use crate::session::SessionUser;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub had_workspace: bool,
}

pub async fn current_user(user: SessionUser) -> Json<JSend<SessionUser>> {
    JSend::success(user)
}

/// Drop the user's workspace. The identity itself belongs to the auth proxy.
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Json<JSend<SignOutResponse>> {
    let had_workspace = state.end_session(&user.email).await;
    tracing::info!(user = %user.email, had_workspace, "Session ended");
    JSend::success(SignOutResponse { had_workspace })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_state, OWNER};

    #[tokio::test]
    async fn sign_out_discards_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let user = SessionUser {
            email: OWNER.to_string(),
            display_name: Some("Owner".to_string()),
            avatar_url: None,
        };

        state.workspace(OWNER).await.lock().await.info("hello");
        let first = sign_out(State(state.clone()), user.clone()).await;
        assert!(first.0.data.had_workspace);

        let second = sign_out(State(state.clone()), user).await;
        assert!(!second.0.data.had_workspace);
        assert!(state.workspace(OWNER).await.lock().await.take_notice().is_none());
    }
}
