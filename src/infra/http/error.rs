use std::io::ErrorKind;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use texforge_api_types::ErrorBody;

use crate::application::error::{CompileError, ErrorReport};
use crate::infra::artifacts::ArtifactStoreError;

const NOT_FOUND_DETAIL: &str = "File not found";

/// Error response rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(source: &'static str, status: StatusCode, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let report = ErrorReport::from_message(source, status, detail.clone());
        Self {
            status,
            detail,
            report,
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, detail)
    }

    /// Malformed or oversized request bodies.
    pub fn from_rejection(source: &'static str, rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(
            source,
            status,
            format!("Invalid request: {}", rejection.body_text()),
        )
    }

    pub fn from_compile(source: &'static str, error: CompileError) -> Self {
        let status = error.status_code();
        Self {
            status,
            detail: error.detail(),
            report: ErrorReport::from_error(source, status, &error),
        }
    }

    pub fn from_artifact(source: &'static str, error: ArtifactStoreError) -> Self {
        match &error {
            ArtifactStoreError::InvalidPath => Self::not_found(source, NOT_FOUND_DETAIL),
            ArtifactStoreError::Io(err) if err.kind() == ErrorKind::NotFound => {
                Self::not_found(source, NOT_FOUND_DETAIL)
            }
            _ => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                Self {
                    status,
                    detail: format!("Failed to store or read the PDF: {error}"),
                    report: ErrorReport::from_error(source, status, &error),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        self.report.attach(&mut response);
        response
    }
}
