//! Error types for the activity monitor

use thiserror::Error;

use crate::schema::ClassifyError;

/// Errors surfaced at the crate boundary.
///
/// Ingestion itself never fails; these come from the classifier, export and
/// configuration layers around it.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Malformed interaction: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse interaction input: {0}")]
    ParseError(String),

    #[error("No activity to export")]
    EmptyLog,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
