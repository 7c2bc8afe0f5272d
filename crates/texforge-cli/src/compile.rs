#![deny(clippy::all, clippy::pedantic)]

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use texforge_api_types::{CompileBase64Response, CompileRequest, CompileUrlResponse, paths};

use crate::args::{CompileArgs, DeliveryMode};
use crate::client::{CliError, Ctx};

const FALLBACK_FILENAME: &str = "document.pdf";

/// What a compile command left behind.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivered {
    Written(PathBuf),
    Linked(String),
}

pub async fn handle(ctx: &Ctx, args: CompileArgs) -> Result<Delivered, CliError> {
    let latex = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|source| CliError::InputFile {
            path: args.file.display().to_string(),
            source,
        })?;
    let request = CompileRequest::new(latex, args.filename);

    match args.mode {
        DeliveryMode::Direct => {
            let (headers, bytes) = ctx.post_for_bytes(paths::COMPILE, &request).await?;
            let suggested = attachment_filename(&headers);
            let target = output_path(args.output, suggested.as_deref());
            write_pdf(&target, &bytes).await?;
            Ok(Delivered::Written(target))
        }
        DeliveryMode::Base64 => {
            let body: CompileBase64Response =
                ctx.post_json(paths::COMPILE_BASE64, &request).await?;
            let bytes = STANDARD
                .decode(body.pdf_base64.as_bytes())
                .map_err(|e| CliError::InvalidResponse(format!("invalid base64 payload: {e}")))?;
            let target = output_path(args.output, Some(&body.filename));
            write_pdf(&target, &bytes).await?;
            Ok(Delivered::Written(target))
        }
        DeliveryMode::Url => {
            let body: CompileUrlResponse = ctx.post_json(paths::COMPILE_URL, &request).await?;
            Ok(Delivered::Linked(body.download_url))
        }
    }
}

/// Filename from `Content-Disposition: attachment; filename="..."`.
pub fn attachment_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn output_path(explicit: Option<PathBuf>, suggested: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    // Only the final component of a server-suggested name is honoured.
    suggested
        .and_then(|name| Path::new(name).file_name())
        .map_or_else(|| PathBuf::from(FALLBACK_FILENAME), PathBuf::from)
}

async fn write_pdf(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| CliError::OutputFile {
            path: path.display().to_string(),
            source,
        })
}
