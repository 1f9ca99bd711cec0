//! Generator request and response types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling parameters for text generation, fixed per call site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub candidate_count: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.8,
            top_k: 10,
            candidate_count: 1,
            max_output_tokens: 1024,
        }
    }
}

/// Output aspect ratio for generated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    Square,
    Portrait3x4,
    Landscape4x3,
    Portrait9x16,
    Landscape16x9,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated image payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Voice selection for speech synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceGender {
    Neutral,
    Female,
    Male,
}

impl VoiceGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceGender::Neutral => "NEUTRAL",
            VoiceGender::Female => "FEMALE",
            VoiceGender::Male => "MALE",
        }
    }
}

/// Encoding of synthesized audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    Mp3,
    OggOpus,
    Linear16,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::OggOpus => "OGG_OPUS",
            AudioEncoding::Linear16 => "LINEAR16",
        }
    }
}

/// Connection settings for Vertex AI hosted models
#[derive(Debug, Clone)]
pub struct VertexSettings {
    pub project_id: String,
    pub location: String,
    pub access_token: String,
    /// Overrides `https://{location}-aiplatform.googleapis.com`
    pub base_url: Option<String>,
}

impl VertexSettings {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            access_token: access_token.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// REST endpoint of a publisher model method
    pub fn model_endpoint(&self, model: &str, method: &str) -> String {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.location));
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            base.trim_end_matches('/'),
            self.project_id,
            self.location,
            model,
            method
        )
    }
}
