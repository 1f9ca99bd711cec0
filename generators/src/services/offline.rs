//! Deterministic offline generators for dry runs and local development
//!
//! Every call returns output derived only from its inputs, so repeated
//! runs over the same catalog stage byte-identical artifacts.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use shared::ApiFailure;

use crate::traits::{ImageGenerator, SpeechSynthesizer, TextGenerator};
use crate::types::{AspectRatio, AudioEncoding, GeneratedImage, GenerationParameters, VoiceGender};

/// Thai sentence appended to every offline text response
const OFFLINE_THAI_COPY: &str = "สินค้าคุณภาพดี ซื้อเลยวันนี้";

/// JPEG start and end markers framing the placeholder image payload
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// MPEG audio frame header used for the placeholder narration
const MP3_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];

/// Generator that never leaves the process
#[derive(Debug, Clone, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Leading eight bytes of the input's SHA-256
    fn fingerprint(input: &str) -> u64 {
        let digest = Sha256::digest(input.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(prefix)
    }
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, prompt: &str, _parameters: &GenerationParameters) -> Result<String, ApiFailure> {
        if prompt.trim().is_empty() {
            return Err(ApiFailure::InvalidRequest("prompt is empty".to_string()));
        }
        Ok(format!(
            "A fluffy yellow chick happily showing off the product (ref {:016x}). {}",
            Self::fingerprint(prompt),
            OFFLINE_THAI_COPY
        ))
    }
}

#[async_trait]
impl ImageGenerator for OfflineGenerator {
    async fn generate(
        &self,
        prompt: &str,
        count: u32,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<GeneratedImage>, ApiFailure> {
        let images = (0..count)
            .map(|index| {
                let seed = format!("{prompt}|{}|{index}", aspect_ratio.as_str());
                let mut bytes = JPEG_SOI.to_vec();
                bytes.extend_from_slice(&Self::fingerprint(&seed).to_be_bytes());
                bytes.extend_from_slice(&JPEG_EOI);
                GeneratedImage {
                    bytes,
                    mime_type: "image/jpeg".to_string(),
                }
            })
            .collect();
        Ok(images)
    }
}

#[async_trait]
impl SpeechSynthesizer for OfflineGenerator {
    async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        voice_gender: VoiceGender,
        encoding: AudioEncoding,
    ) -> Result<Vec<u8>, ApiFailure> {
        if text.trim().is_empty() {
            return Err(ApiFailure::InvalidRequest("narration text is empty".to_string()));
        }
        let seed = format!("{text}|{language_code}|{}|{}", voice_gender.as_str(), encoding.as_str());
        let mut bytes = MP3_FRAME_HEADER.to_vec();
        bytes.extend_from_slice(&Self::fingerprint(&seed).to_be_bytes());
        Ok(bytes)
    }
}
