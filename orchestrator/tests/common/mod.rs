//! Common test utilities and infrastructure
//!
//! Shared fixtures, an in-memory artifact sink and a builder for wiring the
//! pipeline with fakes or mocks.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{InMemorySink, PipelineBuilder};
