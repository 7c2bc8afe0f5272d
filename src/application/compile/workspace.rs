use std::{
    io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use tokio::fs;

use crate::domain::source::LatexSource;

use super::{LOG_FILENAME, OUTPUT_FILENAME, SOURCE_FILENAME};

const WORKSPACE_PREFIX: &str = "texforge-";

/// Per-request scratch directory. Removed on `close` or, failing that, on drop.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub async fn write_source(&self, source: &LatexSource) -> io::Result<PathBuf> {
        let path = self.path().join(SOURCE_FILENAME);
        fs::write(&path, source.as_bytes()).await?;
        Ok(path)
    }

    pub fn output_path(&self) -> PathBuf {
        self.path().join(OUTPUT_FILENAME)
    }

    /// Compiler log written next to the output; empty when absent or unreadable.
    pub async fn read_log(&self) -> String {
        match fs::read(self.path().join(LOG_FILENAME)).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }

    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
