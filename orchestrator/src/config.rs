//! Pipeline configuration from environment variables
//!
//! `.env` is loaded by the binary before [`PipelineConfig::from_env`] runs.
//! Parsing goes through a key lookup closure so it can be exercised without
//! touching the process environment.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use shared::{dimension, AttributeDimension, Product, SharedError};

use crate::core::retry::RetryPolicy;
use crate::error::{OrchestratorError, OrchestratorResult};

pub const DEFAULT_LOCATION: &str = "asia-southeast1";
pub const DEFAULT_LANGUAGE_CODE: &str = "th-TH";
pub const DEFAULT_STAGING_DIR: &str = "tmp";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub project_id: Option<String>,
    pub location: String,
    pub gemini_model: Option<String>,
    pub imagen_model: Option<String>,
    pub access_token: Option<String>,
    pub bucket_name: String,
    pub collection: String,
    pub catalog_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub images_per_task: u32,
    pub weather_conditions: Vec<String>,
    pub regions: Vec<String>,
    pub genders: Vec<String>,
    pub age_groups: Vec<String>,
    pub job_types: Vec<String>,
    /// Age bracket to descriptive range from `AGE_RANGE_<BRACKET>`
    pub age_ranges: HashMap<String, String>,
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub call_timeout: Duration,
    pub concurrency: usize,
    pub requests_per_minute: Option<NonZeroU32>,
    pub staging_dir: PathBuf,
    pub language_code: String,
}

/// Settings needed only when talking to Google Cloud
#[derive(Debug, Clone, Copy)]
pub struct GcpSettings<'a> {
    pub project_id: &'a str,
    pub location: &'a str,
    pub gemini_model: &'a str,
    pub imagen_model: &'a str,
    pub access_token: &'a str,
}

impl PipelineConfig {
    pub fn from_env() -> OrchestratorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> OrchestratorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| SharedError::missing(key));
        let list = |key: &str| -> OrchestratorResult<Vec<String>> {
            let raw = required(key)?;
            let values: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                return Err(SharedError::invalid(key, raw).into());
            }
            Ok(values)
        };
        let number = |key: &str, default: u64| -> OrchestratorResult<u64> {
            match get(key) {
                Some(raw) => raw.parse().map_err(|_| SharedError::invalid(key, raw).into()),
                None => Ok(default),
            }
        };

        let age_groups = list("AGE_GROUPS")?;
        let mut age_ranges = HashMap::new();
        for group in &age_groups {
            let key = format!("AGE_RANGE_{}", group.to_uppercase());
            age_ranges.insert(group.clone(), required(&key)?);
        }

        let max_attempts = number("MAX_ATTEMPTS", 5)?;
        if max_attempts == 0 {
            return Err(SharedError::invalid("MAX_ATTEMPTS", "0").into());
        }
        let concurrency = number("CONCURRENCY", 1)?;
        if concurrency == 0 {
            return Err(SharedError::invalid("CONCURRENCY", "0").into());
        }

        let requests_per_minute = match get("REQUESTS_PER_MINUTE") {
            Some(raw) => Some(
                raw.parse::<NonZeroU32>()
                    .map_err(|_| SharedError::invalid("REQUESTS_PER_MINUTE", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            project_id: get("PROJECT_ID"),
            location: get("LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            gemini_model: get("GEMINI_MODEL"),
            imagen_model: get("IMAGEN_MODEL"),
            access_token: get("GOOGLE_ACCESS_TOKEN"),
            bucket_name: required("BUCKET_NAME")?,
            collection: required("FIREBASE_COLLECTION")?,
            catalog_path: get("PRODUCT_FILE_PATH").map(PathBuf::from),
            log_file: get("LOG_FILE_PATH").map(PathBuf::from),
            images_per_task: u32::try_from(number("N_IMAGES", 1)?)
                .map_err(|_| SharedError::invalid("N_IMAGES", "out of range"))?,
            weather_conditions: list("WEATHER_CONDITIONS")?,
            regions: list("REGIONS")?,
            genders: list("GENDERS")?,
            age_groups,
            job_types: list("JOB_TYPES")?,
            age_ranges,
            max_attempts: u32::try_from(max_attempts)
                .map_err(|_| SharedError::invalid("MAX_ATTEMPTS", max_attempts.to_string()))?,
            initial_delay: Duration::from_millis(number("INITIAL_DELAY_MS", 5_000)?),
            call_timeout: Duration::from_secs(number("CALL_TIMEOUT_SECS", 120)?),
            concurrency: usize::try_from(concurrency)
                .map_err(|_| SharedError::invalid("CONCURRENCY", concurrency.to_string()))?,
            requests_per_minute,
            staging_dir: get("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            language_code: get("TTS_LANGUAGE_CODE").unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
        })
    }

    /// Google Cloud settings, failing on the first missing one
    pub fn gcp(&self) -> OrchestratorResult<GcpSettings<'_>> {
        fn need<'v>(value: &'v Option<String>, key: &str) -> OrchestratorResult<&'v str> {
            value
                .as_deref()
                .ok_or_else(|| OrchestratorError::from(SharedError::missing(key)))
        }

        Ok(GcpSettings {
            project_id: need(&self.project_id, "PROJECT_ID")?,
            location: &self.location,
            gemini_model: need(&self.gemini_model, "GEMINI_MODEL")?,
            imagen_model: need(&self.imagen_model, "IMAGEN_MODEL")?,
            access_token: need(&self.access_token, "GOOGLE_ACCESS_TOKEN")?,
        })
    }

    /// Dimensions in enumeration order, products first
    pub fn attribute_dimensions(&self, products: &[Product]) -> Vec<AttributeDimension> {
        vec![
            AttributeDimension::new(dimension::PRODUCT, products.iter().map(|p| p.article_no.clone())),
            AttributeDimension::new(dimension::WEATHER, self.weather_conditions.clone()),
            AttributeDimension::new(dimension::REGION, self.regions.clone()),
            AttributeDimension::new(dimension::GENDER, self.genders.clone()),
            AttributeDimension::new(dimension::AGE, self.age_groups.clone()),
            AttributeDimension::new(dimension::JOB, self.job_types.clone()),
        ]
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.initial_delay).with_call_timeout(self.call_timeout)
    }
}
