use std::{io, path::Path, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

/// How a single compiler invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failed {
        exit_code: Option<i32>,
        /// Combined stdout and stderr.
        output: String,
    },
    TimedOut,
}

#[derive(Debug, Error)]
pub enum CompilerSpawnError {
    #[error("compiler executable `{program}` could not be started")]
    Unavailable {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("compiler invocation failed: {0}")]
    Io(#[from] io::Error),
}

/// A black-box LaTeX toolchain that turns the workspace's source file into a PDF.
///
/// Implementations run exactly one pass per call and must not leave the
/// process running after returning, including on timeout.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    /// Name reported in diagnostics.
    fn program(&self) -> String;

    async fn run(
        &self,
        workspace: &Path,
        timeout: Duration,
    ) -> Result<ExitOutcome, CompilerSpawnError>;
}
