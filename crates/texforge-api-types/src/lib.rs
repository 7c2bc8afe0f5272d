//! Wire types shared by the texforge server and its command-line client.

use serde::{Deserialize, Serialize};

/// MIME type reported for every compiled document.
pub const PDF_MIME_TYPE: &str = "application/pdf";

pub mod paths {
    pub const HEALTH: &str = "/";
    pub const COMPILE: &str = "/compile";
    pub const COMPILE_BASE64: &str = "/compile_base64";
    pub const COMPILE_URL: &str = "/compile_url";
    pub const FILES_PREFIX: &str = "/files/";
}

/// Body accepted by every compile endpoint.
///
/// `latex` is optional at the wire level so that a missing field is reported
/// with the same error envelope as a too-short source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileRequest {
    #[serde(default)]
    pub latex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl CompileRequest {
    pub fn new(latex: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            latex: Some(latex.into()),
            filename,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileBase64Response {
    pub filename: String,
    pub mime_type: String,
    pub pdf_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileUrlResponse {
    pub filename: String,
    pub download_url: String,
}

/// Error envelope returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_request_accepts_missing_fields() {
        let request: CompileRequest = serde_json::from_str("{}").expect("empty object parses");
        assert_eq!(request, CompileRequest::default());
    }

    #[test]
    fn compile_request_omits_absent_filename() {
        let value = serde_json::to_value(CompileRequest::new("x", None)).expect("serialize");
        assert_eq!(value, serde_json::json!({ "latex": "x" }));
    }
}
