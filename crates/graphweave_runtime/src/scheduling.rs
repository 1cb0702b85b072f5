//! Scheduling strategies for field resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the execution stage runs resolvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheduling {
    /// Every resolver runs on the thread polling the execution, one at a time,
    /// in selection order
    #[default]
    SingleThread,
    /// Sibling fields and list items are resolved concurrently; resolvers run
    /// on the Tokio blocking pool and are raced against interruption
    WorkerPool,
}

impl Scheduling {
    /// Check if sibling resolution may overlap
    #[must_use]
    pub const fn is_concurrent(&self) -> bool {
        matches!(self, Self::WorkerPool)
    }
}

impl fmt::Display for Scheduling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleThread => write!(f, "single_thread"),
            Self::WorkerPool => write!(f, "worker_pool"),
        }
    }
}
