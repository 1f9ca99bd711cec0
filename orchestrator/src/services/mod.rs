//! Service implementations
//!
//! Real implementations of the orchestrator's storage and catalog traits,
//! plus the local staging area used by the task pipeline.

pub mod catalog;
pub mod gcp_sink;
pub mod local_sink;
pub mod staging;

#[cfg(test)]
pub mod tests;

pub use catalog::JsonCatalogSource;
pub use gcp_sink::GcpArtifactSink;
pub use local_sink::LocalArtifactSink;
pub use staging::StagingArea;
