//! Pipeline configuration.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Default name of request sources, as shown in syntax errors
pub const DEFAULT_SOURCE_NAME: &str = "GraphQL request";

/// Default name of worker threads
pub const DEFAULT_THREAD_NAME: &str = "graphweave-worker";

/// Settings of a [`Pipeline`](crate::Pipeline)
///
/// Missing fields take their defaults when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name given to every request source
    pub source_name: String,
    /// Worker thread count; `None` uses one per core
    pub worker_threads: Option<usize>,
    /// Name of worker threads
    pub thread_name: String,
    /// Maximum selection depth; zero means unlimited
    pub max_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            worker_threads: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            max_depth: 0,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a configuration from JSON
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or a value is unusable
    pub fn from_json(input: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    /// Set the source name
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Set the worker thread count
    #[must_use]
    pub const fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Set the worker thread name
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the maximum selection depth
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reject values the worker runtime cannot use
    ///
    /// # Errors
    ///
    /// Returns error naming the first unusable setting
    pub fn check(&self) -> PipelineResult<()> {
        if self.worker_threads == Some(0) {
            return Err(PipelineError::InvalidValue {
                field: "worker_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.thread_name.is_empty() {
            return Err(PipelineError::InvalidValue {
                field: "thread_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
