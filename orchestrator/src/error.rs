//! Orchestrator-specific error types

use std::path::Path;

use generators::GeneratorError;
use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },

    #[error("File system operation failed: {operation} on {path}: {source}")]
    FileSystemError {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("Generator setup error: {0}")]
    GeneratorError(#[from] GeneratorError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn config(message: impl Into<String>) -> Self {
        OrchestratorError::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        OrchestratorError::CatalogError {
            message: message.into(),
        }
    }

    pub fn file_system(operation: &str, path: &Path, source: std::io::Error) -> Self {
        OrchestratorError::FileSystemError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether the error was raised before any task could run
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OrchestratorError::ConfigurationError { .. }
                | OrchestratorError::CatalogError { .. }
                | OrchestratorError::SharedError(_)
                | OrchestratorError::GeneratorError(_)
        )
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
