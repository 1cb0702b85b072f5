//! Error types for pipeline construction.
//!
//! Request failures never show up here; they are reported through the
//! `errors` of an [`ExecutionResult`](crate::ExecutionResult).

use thiserror::Error;

/// Result type for pipeline construction
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline construction error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration could not be decoded
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration decoded but holds an unusable value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Offending setting
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Worker runtime could not be started
    #[error("Failed to start worker runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
