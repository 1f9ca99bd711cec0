//! Core types used throughout the ad creative pipeline

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Canonical dimension names, in enumeration order
pub mod dimension {
    pub const PRODUCT: &str = "product";
    pub const WEATHER: &str = "weather";
    pub const REGION: &str = "region";
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const JOB: &str = "job";

    /// First entry varies slowest during enumeration
    pub const ORDER: [&str; 6] = [PRODUCT, WEATHER, REGION, GENDER, AGE, JOB];
}

/// Named, ordered list of discrete attribute values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDimension {
    pub name: String,
    pub values: Vec<String>,
}

impl AttributeDimension {
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One tuple of the combinatorial space: a value from every dimension, in dimension order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Task {
    ordinal: usize,
    dimensions: Arc<[String]>,
    values: Vec<String>,
}

impl Task {
    /// `dimensions` and `values` must have the same length
    pub fn new(ordinal: usize, dimensions: Arc<[String]>, values: Vec<String>) -> Self {
        debug_assert_eq!(dimensions.len(), values.len());
        Self {
            ordinal,
            dimensions,
            values,
        }
    }

    /// Position of the task in enumeration order
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Look up the value of a dimension by name
    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .position(|name| name == dimension)
            .map(|index| self.values[index].as_str())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.values.join(", "))
    }
}

/// Fixed-width content address of a task (lowercase hex SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskIdentifier(String);

impl TaskIdentifier {
    pub const HEX_LEN: usize = 64;

    /// Build from a raw 32-byte digest
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let hex = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of artifact produced for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    AdText,
    Image,
    Narration,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::AdText => "txt",
            ArtifactKind::Image => "jpg",
            ArtifactKind::Narration => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::AdText => "text/plain; charset=utf-8",
            ArtifactKind::Image => "image/jpeg",
            ArtifactKind::Narration => "audio/mpeg",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::AdText => write!(f, "ad-text"),
            ArtifactKind::Image => write!(f, "image"),
            ArtifactKind::Narration => write!(f, "narration"),
        }
    }
}

/// A locally staged artifact waiting for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationArtifact {
    pub identifier: TaskIdentifier,
    pub sequence: u32,
    pub kind: ArtifactKind,
    pub local_path: PathBuf,
}

/// Persisted metadata document for a completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub advertisement_id: TaskIdentifier,
    pub storage_path: String,
    pub article_no: String,
    pub barcode: String,
    pub weather: String,
    pub region: String,
    pub gender: String,
    pub age: String,
    pub job: String,
    pub description: String,
}

/// Catalog row for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "string_or_number")]
    pub article_no: String,
    pub product_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub barcode: String,
    pub class: String,
    pub sub_class: String,
    pub brand: String,
}

/// Spreadsheet exports frequently render article numbers and barcodes as numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(u64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) if value.fract() == 0.0 && value >= 0.0 => format!("{value:.0}"),
        Raw::Float(value) => value.to_string(),
    })
}

/// Failure of a call to an external service
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFailure {
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("request timed out")]
    Timeout,

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("server error: {0}")]
    ServerError(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("empty response: {0}")]
    EmptyResponse(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl ApiFailure {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ApiFailure::AuthenticationFailed | ApiFailure::InvalidRequest(_)
        )
    }

    /// Map a non-success HTTP status to a failure
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => ApiFailure::AuthenticationFailed,
            408 | 504 => ApiFailure::Timeout,
            429 => ApiFailure::RateLimitExceeded,
            503 => ApiFailure::ServiceUnavailable,
            500..=599 => ApiFailure::ServerError(format!("HTTP {status}: {body}")),
            _ => ApiFailure::InvalidRequest(format!("HTTP {status}: {body}")),
        }
    }
}
