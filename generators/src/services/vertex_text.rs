//! Gemini text generation on Vertex AI

use async_trait::async_trait;
use serde_json::{json, Value};

use shared::ApiFailure;

use crate::error::{GeneratorError, GeneratorResult};
use crate::services::http::{build_client, check_status, map_send_error, read_json};
use crate::traits::TextGenerator;
use crate::types::{GenerationParameters, VertexSettings};

/// Text generator backed by the Vertex AI `streamGenerateContent` endpoint
pub struct VertexTextGenerator {
    client: reqwest::Client,
    settings: VertexSettings,
    model: String,
}

impl VertexTextGenerator {
    pub fn new(settings: VertexSettings, model: impl Into<String>) -> GeneratorResult<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(GeneratorError::ConfigError {
                message: "model name must not be empty".to_string(),
            });
        }
        url::Url::parse(&settings.model_endpoint(&model, "streamGenerateContent"))?;
        Ok(Self {
            client: build_client()?,
            settings,
            model,
        })
    }

    fn request_body(prompt: &str, parameters: &GenerationParameters) -> Value {
        json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": {
                "temperature": parameters.temperature,
                "topP": parameters.top_p,
                "topK": parameters.top_k,
                "candidateCount": parameters.candidate_count,
                "maxOutputTokens": parameters.max_output_tokens
            }
        })
    }

    /// Concatenate the trimmed text of every streamed chunk
    fn collect_stream_text(body: &Value) -> Result<String, ApiFailure> {
        let chunks: Vec<&Value> = match body {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        let mut output = String::new();
        for chunk in chunks {
            if let Some(reason) = chunk
                .get("promptFeedback")
                .and_then(|feedback| feedback.get("blockReason"))
                .and_then(|reason| reason.as_str())
            {
                return Err(ApiFailure::InvalidRequest(format!("prompt blocked: {reason}")));
            }

            let parts = chunk
                .get("candidates")
                .and_then(|candidates| candidates.get(0))
                .and_then(|candidate| candidate.get("content"))
                .and_then(|content| content.get("parts"))
                .and_then(|parts| parts.as_array());

            for part in parts.into_iter().flatten() {
                if let Some(text) = part.get("text").and_then(|text| text.as_str()) {
                    output.push_str(text.trim());
                }
            }
        }

        if output.is_empty() {
            return Err(ApiFailure::EmptyResponse("no text in generation stream".to_string()));
        }
        Ok(output)
    }
}

#[async_trait]
impl TextGenerator for VertexTextGenerator {
    async fn generate(&self, prompt: &str, parameters: &GenerationParameters) -> Result<String, ApiFailure> {
        let url = self.settings.model_endpoint(&self.model, "streamGenerateContent");
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting text generation");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.access_token)
            .json(&Self::request_body(prompt, parameters))
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;
        let body = read_json(response).await?;
        Self::collect_stream_text(&body)
    }
}
