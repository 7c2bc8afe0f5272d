//! Two-pass LaTeX compilation inside a throwaway workspace.

mod compiler;
mod workspace;

pub use compiler::{CompilerSpawnError, DocumentCompiler, ExitOutcome};
pub use workspace::Workspace;

use std::{
    io::ErrorKind,
    num::NonZeroUsize,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use metrics::{counter, histogram};
use tokio::{fs, sync::Semaphore};
use tracing::{info, warn};

use crate::domain::{filename::OutputFilename, source::LatexSource};

use super::error::CompileError;

pub const SOURCE_FILENAME: &str = "document.tex";
pub const OUTPUT_FILENAME: &str = "document.pdf";
pub const LOG_FILENAME: &str = "document.log";

/// The second pass resolves references (table of contents, citations) recorded by the first.
pub const COMPILE_PASSES: u8 = 2;

/// Compiler output kept in error responses, counted from the end.
pub const MAX_LOG_CHARS: usize = 2000;

pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(120);

/// Input of a single compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileCommand {
    pub latex: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub bytes: Bytes,
    pub filename: OutputFilename,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub timeout: Duration,
    /// Parent of per-request workspaces; the system temp directory when `None`.
    pub scratch_dir: Option<PathBuf>,
    /// Upper bound on compilations running at once; unbounded when `None`.
    pub max_concurrency: Option<NonZeroUsize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMPILE_TIMEOUT,
            scratch_dir: None,
            max_concurrency: None,
        }
    }
}

pub struct CompileService {
    compiler: Arc<dyn DocumentCompiler>,
    options: CompileOptions,
    permits: Option<Arc<Semaphore>>,
}

impl CompileService {
    pub fn new(compiler: Arc<dyn DocumentCompiler>, options: CompileOptions) -> Self {
        let permits = options
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.get())));
        Self {
            compiler,
            options,
            permits,
        }
    }

    /// Validate, compile twice and return the PDF. The workspace never outlives the call.
    pub async fn compile(&self, command: CompileCommand) -> Result<CompiledDocument, CompileError> {
        let started_at = Instant::now();
        let result = self.compile_inner(command).await;
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.kind(),
        };
        counter!("texforge_compile_total", "outcome" => outcome).increment(1);
        histogram!("texforge_compile_ms").record(elapsed_ms as f64);

        match &result {
            Ok(document) => info!(
                target = "application::compile",
                op = "compile",
                result = "success",
                elapsed_ms,
                filename = %document.filename,
                pdf_bytes = document.bytes.len(),
                "LaTeX document compiled"
            ),
            Err(err) => warn!(
                target = "application::compile",
                op = "compile",
                result = "error",
                elapsed_ms,
                error_code = err.kind(),
                error = %err,
                "LaTeX compilation failed"
            ),
        }

        result
    }

    async fn compile_inner(&self, command: CompileCommand) -> Result<CompiledDocument, CompileError> {
        let source = LatexSource::parse(command.latex)?;
        let filename = OutputFilename::sanitize(command.filename.as_deref());

        let _permit = match &self.permits {
            Some(permits) => Some(
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .map_err(|err| CompileError::Io(std::io::Error::other(err)))?,
            ),
            None => None,
        };

        let workspace = Workspace::create(self.options.scratch_dir.as_deref())?;
        let result = self.run_passes(&workspace, &source).await;
        let workspace_path = workspace.path().to_path_buf();
        if let Err(err) = workspace.close() {
            warn!(
                target = "application::compile",
                op = "workspace::close",
                workspace = %workspace_path.display(),
                error = %err,
                "Failed to remove compile workspace"
            );
        }

        result.map(|bytes| CompiledDocument { bytes, filename })
    }

    async fn run_passes(
        &self,
        workspace: &Workspace,
        source: &LatexSource,
    ) -> Result<Bytes, CompileError> {
        workspace.write_source(source).await?;

        for pass in 1..=COMPILE_PASSES {
            let pass_started_at = Instant::now();
            let outcome = self
                .compiler
                .run(workspace.path(), self.options.timeout)
                .await
                .map_err(|err| match err {
                    CompilerSpawnError::Unavailable { program, source } => {
                        CompileError::ToolMissing { program, source }
                    }
                    CompilerSpawnError::Io(err) => CompileError::Io(err),
                })?;
            counter!("texforge_compiler_pass_total", "pass" => pass.to_string()).increment(1);

            match outcome {
                ExitOutcome::Success => {
                    info!(
                        target = "application::compile",
                        op = "compile::pass",
                        pass,
                        elapsed_ms = pass_started_at.elapsed().as_millis() as u64,
                        "Compiler pass finished"
                    );
                }
                ExitOutcome::Failed { exit_code, output } => {
                    let output = if output.trim().is_empty() {
                        workspace.read_log().await
                    } else {
                        output
                    };
                    return Err(CompileError::Compilation {
                        exit_code,
                        log: tail_chars(&output, MAX_LOG_CHARS).to_string(),
                    });
                }
                ExitOutcome::TimedOut => {
                    return Err(CompileError::Timeout {
                        pass,
                        timeout: self.options.timeout,
                    });
                }
            }
        }

        match fs::read(workspace.output_path()).await {
            Ok(bytes) if !bytes.is_empty() => Ok(Bytes::from(bytes)),
            Ok(_) => Err(CompileError::OutputMissing {
                expected: OUTPUT_FILENAME,
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(CompileError::OutputMissing {
                expected: OUTPUT_FILENAME,
            }),
            Err(err) => Err(CompileError::Io(err)),
        }
    }
}

/// The last `max` characters of `text`; LaTeX reports the fatal error at the end.
fn tail_chars(text: &str, max: usize) -> &str {
    let total = text.chars().count();
    if total <= max {
        return text;
    }
    let skip = total - max;
    match text.char_indices().nth(skip) {
        Some((offset, _)) => &text[offset..],
        None => "",
    }
}
