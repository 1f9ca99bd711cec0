//! Cloud Text-to-Speech narration

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

use shared::ApiFailure;

use crate::error::GeneratorResult;
use crate::services::http::{build_client, check_status, map_send_error, read_json};
use crate::traits::SpeechSynthesizer;
use crate::types::{AudioEncoding, VoiceGender};

const DEFAULT_TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Speech synthesizer backed by the Cloud Text-to-Speech REST API
pub struct CloudSpeechSynthesizer {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    /// Billing project sent as `x-goog-user-project`
    quota_project: Option<String>,
}

impl CloudSpeechSynthesizer {
    pub fn new(access_token: impl Into<String>) -> GeneratorResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: DEFAULT_TTS_BASE_URL.to_string(),
            access_token: access_token.into(),
            quota_project: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> GeneratorResult<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)?;
        self.base_url = base_url;
        Ok(self)
    }

    pub fn with_quota_project(mut self, project_id: impl Into<String>) -> Self {
        self.quota_project = Some(project_id.into());
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudSpeechSynthesizer {
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

        let url = format!("{}/v1/text:synthesize", self.base_url.trim_end_matches('/'));
        let request_body = json!({
            "input": { "text": text },
            "voice": {
                "languageCode": language_code,
                "ssmlGender": voice_gender.as_str()
            },
            "audioConfig": { "audioEncoding": encoding.as_str() }
        });

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request_body);
        if let Some(project) = &self.quota_project {
            request = request.header("x-goog-user-project", project);
        }

        let response = request.send().await.map_err(map_send_error)?;
        let response = check_status(response).await?;
        let body = read_json(response).await?;

        let encoded = body
            .get("audioContent")
            .and_then(|content| content.as_str())
            .ok_or_else(|| ApiFailure::EmptyResponse("no audioContent in response".to_string()))?;

        STANDARD
            .decode(encoded)
            .map_err(|e| ApiFailure::ServerError(format!("invalid audio payload: {e}")))
    }
}
