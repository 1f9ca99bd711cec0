//! Filesystem artifact sink
//!
//! Mirrors the remote layout on disk so a dry run produces the same tree a
//! real run would upload:
//! - artifacts: `{root}/{bucket}/advertisement/{id}/{sequence}.{ext}`
//! - records:   `{root}/{collection}/{id}.json`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use shared::{ApiFailure, ArtifactKind, GenerationRecord, TaskIdentifier};

use crate::core::identifier::artifact_object_name;
use crate::traits::ArtifactSink;

pub struct LocalArtifactSink {
    /// Base directory for all output
    root: PathBuf,
    bucket: String,
    collection: String,
}

impl LocalArtifactSink {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            collection: collection.into(),
        }
    }

    pub fn artifact_path(&self, identifier: &TaskIdentifier, sequence: u32, kind: ArtifactKind) -> PathBuf {
        self.root
            .join(&self.bucket)
            .join(artifact_object_name(identifier, sequence, kind))
    }

    pub fn record_path(&self, identifier: &TaskIdentifier) -> PathBuf {
        self.root
            .join(&self.collection)
            .join(format!("{}.json", identifier))
    }

    fn storage_error(operation: &str, path: &Path, error: std::io::Error) -> ApiFailure {
        ApiFailure::StorageError(format!("{} {}: {}", operation, path.display(), error))
    }

    async fn ensure_parent(path: &Path) -> Result<(), ApiFailure> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::storage_error("create directory", parent, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactSink for LocalArtifactSink {
    async fn put(
        &self,
        local_path: &Path,
        identifier: &TaskIdentifier,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<String, ApiFailure> {
        let destination = self.artifact_path(identifier, sequence, kind);
        Self::ensure_parent(&destination).await?;

        fs::copy(local_path, &destination)
            .await
            .map_err(|e| Self::storage_error("copy to", &destination, e))?;

        tracing::debug!("💾 Stored {} at {}", kind, destination.display());
        Ok(destination.display().to_string())
    }

    async fn put_record(&self, record: &GenerationRecord) -> Result<(), ApiFailure> {
        let path = self.record_path(&record.advertisement_id);
        Self::ensure_parent(&path).await?;

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| ApiFailure::InvalidRequest(format!("record serialization: {e}")))?;

        // Write then rename so a reader never sees a half-written record
        let partial = path.with_extension("json.partial");
        fs::write(&partial, content)
            .await
            .map_err(|e| Self::storage_error("write", &partial, e))?;
        fs::rename(&partial, &path)
            .await
            .map_err(|e| Self::storage_error("rename to", &path, e))?;

        tracing::debug!("💾 Wrote record {}", path.display());
        Ok(())
    }

    async fn record_exists(&self, identifier: &TaskIdentifier) -> Result<bool, ApiFailure> {
        let path = self.record_path(identifier);
        fs::try_exists(&path)
            .await
            .map_err(|e| Self::storage_error("stat", &path, e))
    }
}
