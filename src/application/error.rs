use std::{error::Error as StdError, io, time::Duration};

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::domain::error::DomainError;

/// Diagnostic attached to error responses and consumed by the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Terminal failure of a single compile request.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("LaTeX compilation failed (exit {exit_code:?})")]
    Compilation { exit_code: Option<i32>, log: String },
    #[error("compiler `{program}` is not available")]
    ToolMissing {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("compiler pass {pass} exceeded the {}s timeout", timeout.as_secs())]
    Timeout { pass: u8, timeout: Duration },
    #[error("compiler reported success but produced no `{expected}`")]
    OutputMissing { expected: &'static str },
    #[error("workspace i/o failed: {0}")]
    Io(#[from] io::Error),
}

impl CompileError {
    /// Stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Validation(_) => "validation",
            CompileError::Compilation { .. } => "compilation",
            CompileError::ToolMissing { .. } => "tool_missing",
            CompileError::Timeout { .. } => "timeout",
            CompileError::OutputMissing { .. } => "output_missing",
            CompileError::Io(_) => "io",
        }
    }

    /// Content faults are the caller's to fix; everything else is a deployment fault.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CompileError::Validation(_) | CompileError::Compilation { .. } => {
                StatusCode::BAD_REQUEST
            }
            CompileError::ToolMissing { .. }
            | CompileError::Timeout { .. }
            | CompileError::OutputMissing { .. }
            | CompileError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable text for the `detail` field of the error envelope.
    pub fn detail(&self) -> String {
        match self {
            CompileError::Validation(err) => format!("Invalid request: {err}"),
            CompileError::Compilation { log, .. } => {
                format!("LaTeX compilation failed. Compiler output:\n{log}")
            }
            CompileError::ToolMissing { program, .. } => format!(
                "LaTeX compiler `{program}` was not found on the server; check the deployment"
            ),
            CompileError::Timeout { timeout, .. } => format!(
                "LaTeX compilation timed out after {} seconds",
                timeout.as_secs()
            ),
            CompileError::OutputMissing { .. } => {
                "LaTeX compiler finished without producing a PDF".to_string()
            }
            CompileError::Io(err) => format!("Internal error while preparing the document: {err}"),
        }
    }
}
