//! Generator setup error types

use thiserror::Error;

/// Result type for generator construction
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors raised while building generator clients
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid endpoint URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    ClientError(#[from] reqwest::Error),
}
