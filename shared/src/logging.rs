//! Shared logging utilities for consistent tracing across the pipeline

use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info};

use crate::errors::{SharedError, SharedResult};

/// Crates whose events pass the level filter
const PIPELINE_TARGETS: [&str; 3] = ["orchestrator", "generators", "shared"];

/// Build the filter directive string for a base level
pub fn filter_directives(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    let mut directives: Vec<String> = PIPELINE_TARGETS
        .iter()
        .map(|target| format!("{target}={base_level}"))
        .collect();
    directives.push("reqwest=warn".to_string());
    directives.push("hyper=warn".to_string());
    directives.join(",")
}

/// Initialize tracing with stdout output and an optional append-mode log file
pub fn init_tracing(log_level: Option<&str>, log_file: Option<&Path>) -> SharedResult<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let directives = filter_directives(log_level);
    let env_filter = EnvFilter::try_new(&directives).map_err(|e| SharedError::LoggingError {
        message: format!("invalid log level '{directives}': {e}"),
    })?;

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| SharedError::LoggingError {
                    message: format!("cannot open log file {}: {e}", path.display()),
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| SharedError::LoggingError {
            message: e.to_string(),
        })
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for task-aware info logging
#[macro_export]
macro_rules! task_info {
    ($task:expr, $($arg:tt)*) => {
        tracing::info!(
            task = %$task,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for task-aware warning logging
#[macro_export]
macro_rules! task_warn {
    ($task:expr, $($arg:tt)*) => {
        tracing::warn!(
            task = %$task,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for task-aware error logging
#[macro_export]
macro_rules! task_error {
    ($task:expr, $($arg:tt)*) => {
        tracing::error!(
            task = %$task,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for task-aware debug logging
#[macro_export]
macro_rules! task_debug {
    ($task:expr, $($arg:tt)*) => {
        tracing::debug!(
            task = %$task,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(reason: &str) {
    info!(timestamp = format_timestamp(), "🛑 Shutting down: {}", reason);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!(timestamp = format_timestamp(), "✅ {}", message);
}

/// Contextual logging helper for progress updates
pub fn log_progress(action: &str, details: &str) {
    info!(timestamp = format_timestamp(), "📋 {}: {}", action, details);
}
