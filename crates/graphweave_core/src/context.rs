//! Per-request context: cancellation, deadline, and request data.
//!
//! A [`RequestContext`] is an explicit value handed to every stage that can
//! observe it. It is never stored in thread-local or global state. Clones
//! share the same cancellation token and data.

use crate::value::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Why a request stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Interrupt {
    /// The cancellation token fired
    #[error("request cancelled")]
    Cancelled,
    /// The deadline passed
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal, deadline and request-scoped data
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    data: Arc<Map>,
}

impl RequestContext {
    /// Create a context with no deadline and no data
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing cancellation token
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Set an absolute deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attach a request-scoped value
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.data).insert(key.into(), value.into());
        self
    }

    /// Derive a context cancelled together with this one, but cancellable on its own
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            data: Arc::clone(&self.data),
        }
    }

    /// Look up request-scoped data
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// All request-scoped data
    #[must_use]
    pub fn values(&self) -> &Map {
        &self.data
    }

    /// The deadline, if any
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying cancellation token
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this context and every clone and child of it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if the token fired
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Check for cancellation, then for an expired deadline
    ///
    /// # Errors
    ///
    /// Returns the interrupt reason if the request must stop
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.token.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupt::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolve once the request is cancelled or its deadline passes
    ///
    /// Never resolves for a context without a deadline that is never cancelled.
    pub async fn interrupted(&self) -> Interrupt {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Interrupt::Cancelled,
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                        Interrupt::DeadlineExceeded
                    }
                }
            }
            None => {
                self.token.cancelled().await;
                Interrupt::Cancelled
            }
        }
    }
}
