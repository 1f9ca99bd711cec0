//! Imagen image generation on Vertex AI

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

use shared::ApiFailure;

use crate::error::{GeneratorError, GeneratorResult};
use crate::services::http::{build_client, check_status, map_send_error, read_json};
use crate::traits::ImageGenerator;
use crate::types::{AspectRatio, GeneratedImage, VertexSettings};

/// Image generator backed by the Vertex AI Imagen `predict` endpoint
pub struct VertexImageGenerator {
    client: reqwest::Client,
    settings: VertexSettings,
    model: String,
}

impl VertexImageGenerator {
    pub fn new(settings: VertexSettings, model: impl Into<String>) -> GeneratorResult<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(GeneratorError::ConfigError {
                message: "model name must not be empty".to_string(),
            });
        }
        url::Url::parse(&settings.model_endpoint(&model, "predict"))?;
        Ok(Self {
            client: build_client()?,
            settings,
            model,
        })
    }
}

#[async_trait]
impl ImageGenerator for VertexImageGenerator {
    async fn generate(
        &self,
        prompt: &str,
        count: u32,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<GeneratedImage>, ApiFailure> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let url = self.settings.model_endpoint(&self.model, "predict");
        let request_body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": count,
                "aspectRatio": aspect_ratio.as_str(),
                "outputOptions": { "mimeType": "image/jpeg" }
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.access_token)
            .json(&request_body)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;
        let body = read_json(response).await?;

        let predictions = body
            .get("predictions")
            .and_then(|predictions| predictions.as_array())
            .cloned()
            .unwrap_or_default();

        let mut images = Vec::with_capacity(predictions.len());
        for prediction in &predictions {
            let Some(encoded) = prediction.get("bytesBase64Encoded").and_then(|b| b.as_str()) else {
                continue;
            };
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| ApiFailure::ServerError(format!("invalid image payload: {e}")))?;
            let mime_type = prediction
                .get("mimeType")
                .and_then(|m| m.as_str())
                .unwrap_or("image/jpeg")
                .to_string();
            images.push(GeneratedImage { bytes, mime_type });
        }

        // Safety filtering can drop every candidate
        if images.is_empty() {
            return Err(ApiFailure::EmptyResponse("no images returned".to_string()));
        }

        tracing::debug!(model = %self.model, requested = count, received = images.len(), "Images generated");
        Ok(images)
    }
}
