//! Identity of the signed-in user, as asserted by the upstream auth proxy.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Serialize;

use crate::api::response::ApiError;

pub const EMAIL_HEADER: &str = "x-user-email";
pub const NAME_HEADER: &str = "x-user-name";
pub const AVATAR_HEADER: &str = "x-user-avatar";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl SessionUser {
    /// Read the session headers. `None` when no user is signed in.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(SessionUser {
            email: header(EMAIL_HEADER)?.to_lowercase(),
            display_name: header(NAME_HEADER),
            avatar_url: header(AVATAR_HEADER),
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        SessionUser::from_headers(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Sign in required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_email_means_signed_out() {
        let mut headers = HeaderMap::new();
        headers.insert(NAME_HEADER, HeaderValue::from_static("Ada"));
        assert_eq!(SessionUser::from_headers(&headers), None);

        headers.insert(EMAIL_HEADER, HeaderValue::from_static("  "));
        assert_eq!(SessionUser::from_headers(&headers), None);
    }

    #[test]
    fn email_is_normalized() {
        let mut headers = HeaderMap::new();
        headers.insert(EMAIL_HEADER, HeaderValue::from_static("Ada@Example.com"));
        let user = SessionUser::from_headers(&headers).unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.display_name, None);
    }
}
