//! Shared error types for the ad creative pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Missing configuration: {field}")]
    MissingConfig { field: String },

    #[error("Logging setup failed: {message}")]
    LoggingError { message: String },
}

impl SharedError {
    pub fn invalid(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingConfig {
            field: field.into(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
