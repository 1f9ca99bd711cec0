//! HTTP helpers shared by the Google API clients

use std::time::Duration;

use shared::ApiFailure;

use crate::error::GeneratorResult;

/// Upper bound for a single HTTP exchange; the retry executor applies its own per-call timeout on top
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Build the HTTP client used by every Google API client
pub fn build_client() -> GeneratorResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("ad-creative-pipeline/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Classify a transport-level error
pub fn map_send_error(error: reqwest::Error) -> ApiFailure {
    if error.is_timeout() {
        ApiFailure::Timeout
    } else {
        ApiFailure::NetworkError(error.to_string())
    }
}

/// Turn a non-success response into an `ApiFailure`, passing successful responses through
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiFailure::from_status(status.as_u16(), truncate(&body, 300)))
}

/// Parse a JSON body, treating malformed payloads as server faults
pub async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, ApiFailure> {
    response
        .json()
        .await
        .map_err(|e| ApiFailure::ServerError(format!("Failed to parse response: {e}")))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
