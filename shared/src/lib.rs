//! Shared types for the ad creative pipeline
//!
//! Contains the data model that every component agrees on (tasks, identifiers,
//! artifacts, generation records, catalog products), the external call failure
//! taxonomy, and the tracing setup used by the binaries.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
