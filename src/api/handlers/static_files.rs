use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::object_store::ObjectStoreError;
use crate::AppState;

/// Serve blob content by storage key. These are the URLs the local backend hands out
/// as blob references, so like the bucket URLs they are not session-checked.
/// Route: GET /blobs/*key
pub async fn serve_blob(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(key): axum::extract::Path<String>,
) -> Result<Response, ApiError> {
    let data = state.object_store.get(&key).await.map_err(|e| match e {
        ObjectStoreError::NotFound(_) => ApiError::not_found("File content not found"),
        _ => ApiError::internal(format!("Failed to retrieve file: {e}")),
    })?;

    let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
    Ok(content_response(data, &filename, "inline"))
}

/// Build a response carrying file bytes with type, length and disposition headers.
pub(super) fn content_response(data: Bytes, filename: &str, disposition: &str) -> Response {
    let mime = mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string();
    let length = data.len() as u64;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        mime.parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(length));

    let safe_name = filename.replace('"', "");
    if let Ok(value) = format!("{disposition}; filename=\"{safe_name}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Blobs are immutable once uploaded
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("private, max-age=3600"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_headers_follow_file_name() {
        let response = content_response(Bytes::from_static(b"%PDF"), "q3.pdf", "attachment");
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CONTENT_LENGTH], "4");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"q3.pdf\""
        );
    }
}
