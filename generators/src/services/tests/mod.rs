//! Tests for generator services
//!
//! HTTP-backed generators are exercised against a local wiremock server.


use crate::types::VertexSettings;

pub const PROJECT: &str = "test-project";
pub const LOCATION: &str = "asia-southeast1";
pub const TOKEN: &str = "test-token";

pub fn settings_for(server_uri: &str) -> VertexSettings {
    VertexSettings::new(PROJECT, LOCATION, TOKEN).with_base_url(server_uri)
}

pub fn model_path(model: &str, method: &str) -> String {
    format!("/v1/projects/{PROJECT}/locations/{LOCATION}/publishers/google/models/{model}:{method}")
}
