//! `DocumentCompiler` backed by a LaTeX executable on the host.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;

use crate::application::compile::{
    CompilerSpawnError, DocumentCompiler, ExitOutcome, SOURCE_FILENAME,
};

pub const DEFAULT_COMPILER_PROGRAM: &str = "pdflatex";

#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: PathBuf,
}

impl ProcessCompiler {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

#[async_trait]
impl DocumentCompiler for ProcessCompiler {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    async fn run(
        &self,
        workspace: &Path,
        timeout: Duration,
    ) -> Result<ExitOutcome, CompilerSpawnError> {
        let started_at = Instant::now();
        let child = Command::new(&self.program)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(SOURCE_FILENAME)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                warn!(
                    target = "infra::compiler",
                    op = "compiler::spawn",
                    result = "error",
                    program = %self.program.display(),
                    error_code = "spawn_cli",
                    error = %err,
                    "Failed to spawn LaTeX compiler"
                );
                match err.kind() {
                    ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                        CompilerSpawnError::Unavailable {
                            program: self.program(),
                            source: err,
                        }
                    }
                    _ => CompilerSpawnError::Io(err),
                }
            })?;

        // Dropping the in-flight future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    target = "infra::compiler",
                    op = "compiler::run",
                    result = "timeout",
                    program = %self.program.display(),
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    timeout_ms = timeout.as_millis() as u64,
                    "LaTeX compiler exceeded its time budget"
                );
                return Ok(ExitOutcome::TimedOut);
            }
        };

        if output.status.success() {
            return Ok(ExitOutcome::Success);
        }

        let exit_code = output.status.code();
        warn!(
            target = "infra::compiler",
            op = "compiler::run",
            result = "error",
            program = %self.program.display(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            exit_code = exit_code.map(i64::from).unwrap_or(-1),
            error_code = "latex_cli",
            "LaTeX compiler exited unsuccessfully"
        );

        Ok(ExitOutcome::Failed {
            exit_code,
            output: combine_streams(&output.stdout, &output.stderr),
        })
    }
}

fn combine_streams(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (_, true) => stdout.into_owned(),
        (true, false) => stderr.into_owned(),
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr),
    }
}
