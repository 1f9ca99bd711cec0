//! Generation collaborators for the ad creative pipeline
//!
//! This library wraps the external generative services the pipeline depends on
//! (ad copy text, images, narration audio) behind injectable traits, together with
//! the prompt wording used to drive them.

pub mod error;
pub mod prompt;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use error::{GeneratorError, GeneratorResult};
pub use traits::*;
pub use types::*;
