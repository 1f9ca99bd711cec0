//! Generator trait definitions for dependency injection

use async_trait::async_trait;

use crate::types::{AspectRatio, AudioEncoding, GeneratedImage, GenerationParameters, VoiceGender};
use shared::ApiFailure;

/// Text generation service producing plain text from a prompt
#[mockall::automock]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt with fixed sampling parameters
    async fn generate(&self, prompt: &str, parameters: &GenerationParameters) -> Result<String, ApiFailure>;
}

/// Image generation service
#[mockall::automock]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate `count` images for a prompt
    async fn generate(
        &self,
        prompt: &str,
        count: u32,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<GeneratedImage>, ApiFailure>;
}

/// Speech synthesis service
#[mockall::automock]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize narration audio and return the encoded bytes
    async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        voice_gender: VoiceGender,
        encoding: AudioEncoding,
    ) -> Result<Vec<u8>, ApiFailure>;
}
