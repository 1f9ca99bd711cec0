//! Orchestrator library for the localized ad creative batch pipeline
//!
//! Enumerates every product and audience combination, drives each through
//! text, image and narration generation, and stores the results under a
//! content address so reruns overwrite instead of duplicating.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use core::{
    GenerationContext, PipelineSettings, RetryExecutor, RetryPolicy, RunSummary, TaskEnumerator, TaskOutcome,
    TaskPipeline, TaskReport,
};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use traits::{ArtifactSink, CatalogSource, MockArtifactSink};
