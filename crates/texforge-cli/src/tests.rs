#![deny(clippy::all, clippy::pedantic)]

use std::io::Write;

use httpmock::MockServer;
use serde_json::json;
use tempfile::{NamedTempFile, TempDir};
use texforge_api_types::HealthResponse;

use crate::args::{Cli, Commands, CompileArgs, DeliveryMode};
use crate::client::{CliError, Ctx, build_ctx_from_cli};
use crate::compile::{self, Delivered};

const LATEX: &str = "\\documentclass{article}\\begin{document}Hello from the client.\\end{document}";

fn ctx(server: &MockServer) -> Ctx {
    Ctx::new(&server.base_url()).expect("ctx")
}

fn tex_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write tmp");
    file
}

fn compile_args(file: &NamedTempFile, mode: DeliveryMode, output: Option<&TempDir>) -> CompileArgs {
    CompileArgs {
        file: file.path().to_path_buf(),
        filename: Some("report".into()),
        mode,
        output: output.map(|dir| dir.path().join("out.pdf")),
    }
}

#[test]
fn build_ctx_requires_site() {
    let cli = Cli {
        site: None,
        command: Commands::Health,
    };

    let err = build_ctx_from_cli(&cli).expect_err("missing site should fail");
    assert!(matches!(err, CliError::MissingSite));
}

#[test]
fn build_ctx_keeps_path_prefix() -> Result<(), CliError> {
    for site in ["http://127.0.0.1:8000/texforge", "http://127.0.0.1:8000/texforge/"] {
        let cli = Cli {
            site: Some(site.into()),
            command: Commands::Health,
        };

        let ctx = build_ctx_from_cli(&cli)?;
        assert_eq!(
            ctx.url("/compile")?.as_str(),
            "http://127.0.0.1:8000/texforge/compile"
        );
        assert_eq!(ctx.url("/")?.as_str(), "http://127.0.0.1:8000/texforge/");
    }
    Ok(())
}

#[test]
fn build_ctx_without_prefix_uses_root() -> Result<(), CliError> {
    let ctx = Ctx::new("http://127.0.0.1:8000")?;
    assert_eq!(ctx.url("/compile_url")?.as_str(), "http://127.0.0.1:8000/compile_url");
    Ok(())
}

#[tokio::test]
async fn url_mode_reaches_service_behind_subpath() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/texforge/compile_url");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "filename": "report.pdf",
                "download_url": "http://files.example/texforge/files/00ff00ff-report.pdf",
            }));
    });

    let ctx = Ctx::new(&format!("{}/texforge", server.base_url()))?;
    let src = tex_file(LATEX);
    let delivered = compile::handle(&ctx, compile_args(&src, DeliveryMode::Url, None)).await?;

    assert!(matches!(delivered, Delivered::Linked(url) if url.ends_with("00ff00ff-report.pdf")));
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn health_hits_root() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"ok","message":"running"}"#);
    });

    let health: HealthResponse = ctx(&server).get_json("/").await?;
    assert_eq!(health.status, "ok");
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn direct_mode_writes_pdf_bytes() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/compile")
            .json_body(json!({ "latex": LATEX, "filename": "report" }));
        then.status(200)
            .header("content-type", "application/pdf")
            .header("content-disposition", "attachment; filename=\"report.pdf\"")
            .body("%PDF-1.5 direct");
    });

    let src = tex_file(LATEX);
    let out = TempDir::new().expect("out dir");
    let delivered = compile::handle(
        &ctx(&server),
        compile_args(&src, DeliveryMode::Direct, Some(&out)),
    )
    .await?;

    let target = out.path().join("out.pdf");
    assert_eq!(delivered, Delivered::Written(target.clone()));
    assert_eq!(std::fs::read(target).expect("pdf"), b"%PDF-1.5 direct");
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn base64_mode_decodes_payload() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/compile_base64");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "filename": "report.pdf",
                "mime_type": "application/pdf",
                // "%PDF-1.5 b64"
                "pdf_base64": "JVBERi0xLjUgYjY0",
            }));
    });

    let src = tex_file(LATEX);
    let out = TempDir::new().expect("out dir");
    compile::handle(
        &ctx(&server),
        compile_args(&src, DeliveryMode::Base64, Some(&out)),
    )
    .await?;

    assert_eq!(
        std::fs::read(out.path().join("out.pdf")).expect("pdf"),
        b"%PDF-1.5 b64"
    );
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn url_mode_returns_link() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/compile_url");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "filename": "report.pdf",
                "download_url": "http://files.example/files/0a1b2c3d-report.pdf",
            }));
    });

    let src = tex_file(LATEX);
    let delivered = compile::handle(&ctx(&server), compile_args(&src, DeliveryMode::Url, None)).await?;

    assert_eq!(
        delivered,
        Delivered::Linked("http://files.example/files/0a1b2c3d-report.pdf".into())
    );
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn server_detail_is_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/compile");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"detail":"LaTeX compilation failed. Compiler output:\n! Undefined control sequence."}"#);
    });

    let src = tex_file(LATEX);
    let err = compile::handle(&ctx(&server), compile_args(&src, DeliveryMode::Direct, None))
        .await
        .expect_err("400 should fail");

    match err {
        CliError::Server { status, detail } => {
            assert_eq!(status.as_u16(), 400);
            assert!(detail.contains("Undefined control sequence"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_input_file_is_reported() {
    let server = MockServer::start();
    let args = CompileArgs {
        file: "/definitely/not/here.tex".into(),
        filename: None,
        mode: DeliveryMode::Direct,
        output: None,
    };

    let err = compile::handle(&ctx(&server), args)
        .await
        .expect_err("missing file should fail");
    assert!(matches!(err, CliError::InputFile { .. }));
}
