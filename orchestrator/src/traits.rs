//! Trait definitions with mockall annotations for testing
//!
//! The pipeline only talks to storage and catalog backends through these
//! traits, so every backend can be swapped for a mock or an in-memory fake.

use std::path::Path;

use shared::{ApiFailure, ArtifactKind, GenerationRecord, Product, TaskIdentifier};

use crate::error::OrchestratorResult;

/// Uniform interface over artifact upload and metadata persistence
///
/// Uploads are addressed by `(identifier, sequence, kind)`, so writing the
/// same address twice replaces the earlier object instead of duplicating it.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Upload a staged file and return its remote location
    async fn put(
        &self,
        local_path: &Path,
        identifier: &TaskIdentifier,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<String, ApiFailure>;

    /// Write the metadata document keyed by the record's identifier
    async fn put_record(&self, record: &GenerationRecord) -> Result<(), ApiFailure>;

    /// Whether a metadata document already exists for an identifier
    async fn record_exists(&self, identifier: &TaskIdentifier) -> Result<bool, ApiFailure>;
}

/// Source of catalog products
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load and validate every product in the catalog
    async fn load_products(&self) -> OrchestratorResult<Vec<Product>>;
}
