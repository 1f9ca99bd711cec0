//! Pipeline orchestration core
//!
//! Enumeration and identifiers are pure; the retry executor and the task
//! pipeline reach the outside world only through injected traits.

pub mod enumerator;
pub mod identifier;
pub mod pipeline;
pub mod retry;
pub mod summary;

pub use enumerator::TaskEnumerator;
pub use identifier::{artifact_object_name, identifier, storage_prefix};
pub use pipeline::{
    GenerationContext, PipelineSettings, Stage, StageError, StageFailure, TaskOutcome, TaskPipeline, TaskReport,
};
pub use retry::{rate_limiter, RetryError, RetryExecutor, RetryPolicy, SharedRateLimiter};
pub use summary::RunSummary;
