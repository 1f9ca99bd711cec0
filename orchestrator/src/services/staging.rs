//! Local staging area for generated artifacts awaiting upload
//!
//! Layout: `{root}/{identifier}/{sequence}.{ext}`.

use std::io;
use std::path::PathBuf;

use tokio::fs;

use shared::{ArtifactKind, GenerationArtifact, TaskIdentifier};

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn task_dir(&self, identifier: &TaskIdentifier) -> PathBuf {
        self.root.join(identifier.as_str())
    }

    pub fn artifact_path(&self, identifier: &TaskIdentifier, sequence: u32, kind: ArtifactKind) -> PathBuf {
        self.task_dir(identifier)
            .join(format!("{}.{}", sequence, kind.extension()))
    }

    /// Write an artifact, replacing any earlier file at the same address
    pub async fn write(
        &self,
        identifier: &TaskIdentifier,
        sequence: u32,
        kind: ArtifactKind,
        bytes: &[u8],
    ) -> io::Result<GenerationArtifact> {
        fs::create_dir_all(self.task_dir(identifier)).await?;
        let local_path = self.artifact_path(identifier, sequence, kind);
        fs::write(&local_path, bytes).await?;

        tracing::debug!(path = %local_path.display(), bytes = bytes.len(), "Staged {}", kind);
        Ok(GenerationArtifact {
            identifier: identifier.clone(),
            sequence,
            kind,
            local_path,
        })
    }

    /// Remove the staging directory of a task; a missing directory is not an error
    pub async fn clear(&self, identifier: &TaskIdentifier) -> io::Result<()> {
        match fs::remove_dir_all(self.task_dir(identifier)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
