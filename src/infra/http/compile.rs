//! Compile endpoints. Each delivery mode is a thin presentation of `CompileService::compile`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HOST},
        uri::Authority,
    },
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use texforge_api_types::{
    CompileBase64Response, CompileRequest, CompileUrlResponse, HealthResponse, PDF_MIME_TYPE,
    paths,
};
use url::Url;

use crate::application::compile::{CompileCommand, CompiledDocument};

use super::{AppState, error::ApiError};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "texforge LaTeX compilation service is running".to_string(),
    })
}

/// Direct delivery: the PDF itself as an attachment.
pub async fn compile_pdf(
    State(state): State<AppState>,
    payload: Result<Json<CompileRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    const SOURCE: &str = "infra::http::compile::compile_pdf";

    let document = compile(&state, SOURCE, payload).await?;
    Ok(pdf_response(document))
}

/// Encoded delivery: the PDF as base64 inside a JSON envelope.
pub async fn compile_base64(
    State(state): State<AppState>,
    payload: Result<Json<CompileRequest>, JsonRejection>,
) -> Result<Json<CompileBase64Response>, ApiError> {
    const SOURCE: &str = "infra::http::compile::compile_base64";

    let document = compile(&state, SOURCE, payload).await?;
    Ok(Json(CompileBase64Response {
        filename: document.filename.to_string(),
        mime_type: PDF_MIME_TYPE.to_string(),
        pdf_base64: STANDARD.encode(&document.bytes),
    }))
}

/// Persisted-URL delivery: store the PDF for the static host and return its link.
pub async fn compile_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CompileRequest>, JsonRejection>,
) -> Result<Json<CompileUrlResponse>, ApiError> {
    const SOURCE: &str = "infra::http::compile::compile_url";

    let document = compile(&state, SOURCE, payload).await?;
    let base = download_base(&state, &headers).ok_or_else(|| {
        ApiError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Cannot build a download URL: request has no usable Host header",
        )
    })?;
    let stored = state
        .artifacts
        .persist(&document.filename, &document.bytes)
        .await
        .map_err(|err| ApiError::from_artifact(SOURCE, err))?;

    let download_url = base.join(&stored.stored_name).map_err(|err| {
        ApiError::new(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to build download URL: {err}"),
        )
    })?;

    Ok(Json(CompileUrlResponse {
        filename: document.filename.to_string(),
        download_url: download_url.to_string(),
    }))
}

async fn compile(
    state: &AppState,
    source: &'static str,
    payload: Result<Json<CompileRequest>, JsonRejection>,
) -> Result<CompiledDocument, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::from_rejection(source, rejection))?;
    state
        .compiler
        .compile(CompileCommand {
            latex: request.latex,
            filename: request.filename,
        })
        .await
        .map_err(|err| ApiError::from_compile(source, err))
}

fn pdf_response(document: CompiledDocument) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    let length = document.bytes.len().to_string();
    let mut response = (StatusCode::OK, document.bytes).into_response();

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(PDF_MIME_TYPE));
    // Sanitized names are ASCII-only.
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length) {
        headers.insert(CONTENT_LENGTH, value);
    }

    response
}

/// Configured public base URL, or `<scheme>://<host>/files/` of the incoming request.
///
/// The fallback trusts client headers; deployments behind a proxy should set
/// `artifacts.public_base_url`.
fn download_base(state: &AppState, headers: &HeaderMap) -> Option<Url> {
    if let Some(base) = state.public_base_url.as_ref() {
        return Some(base.clone());
    }

    let host = headers.get(HOST)?.to_str().ok()?;
    // Bare `host[:port]` only.
    let authority = host.parse::<Authority>().ok()?;
    if authority.as_str().contains('@') {
        return None;
    }
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .filter(|value| matches!(*value, "http" | "https"))
        .unwrap_or("http");
    Url::parse(&format!("{scheme}://{authority}{}", paths::FILES_PREFIX)).ok()
}
