use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use super::{AppState, error::ApiError};

/// Serve a stored artifact. Names carry a random token, so responses are immutable.
pub async fn serve_artifact(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::files::serve_artifact";

    match state.artifacts.read(&path).await {
        Ok(bytes) => build_artifact_response(&path, bytes),
        Err(err) => ApiError::from_artifact(SOURCE, err).into_response(),
    }
}

fn build_artifact_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}
