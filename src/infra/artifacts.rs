//! Long-lived storage for PDFs delivered by URL.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::info;
use uuid::Uuid;

use crate::domain::filename::OutputFilename;

/// Random bytes in the name prefix; rendered as twice as many hex digits.
const TOKEN_BYTES: usize = 4;
const MAX_TOKEN_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error("could not find a free artifact name after {attempts} attempts")]
    NameExhausted { attempts: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct StoredArtifact {
    /// Name relative to the store root, `<token>-<filename>`.
    pub stored_name: String,
}

/// Filesystem directory served by the static file host. Artifacts are never removed here.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Persist `bytes` under a fresh token-prefixed name. Existing files are never overwritten.
    pub async fn persist(
        &self,
        filename: &OutputFilename,
        bytes: &[u8],
    ) -> Result<StoredArtifact, ArtifactStoreError> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let stored_name = format!("{}-{filename}", random_token());
            let path = self.root.join(&stored_name);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            };

            if let Err(err) = write_all(&mut file, bytes).await {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(err.into());
            }

            counter!("texforge_artifacts_stored_total").increment(1);
            info!(
                target = "infra::artifacts",
                op = "artifacts::persist",
                stored_name = %stored_name,
                path = %path.display(),
                pdf_bytes = bytes.len(),
                "Stored PDF artifact"
            );
            return Ok(StoredArtifact { stored_name });
        }

        Err(ArtifactStoreError::NameExhausted {
            attempts: MAX_TOKEN_ATTEMPTS,
        })
    }

    pub async fn read(&self, stored_name: &str) -> Result<Bytes, ArtifactStoreError> {
        let absolute = self.resolve(stored_name)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, stored_name: &str) -> Result<PathBuf, ArtifactStoreError> {
        let relative = Path::new(stored_name);
        if stored_name.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(ArtifactStoreError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

async fn write_all(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

fn random_token() -> String {
    let id = Uuid::new_v4();
    hex::encode(&id.as_bytes()[..TOKEN_BYTES])
}
