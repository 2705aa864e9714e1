//! Coordinator configuration.

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for how the coordinator talks to its store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Upper bound on a single store call, retries not included
    pub store_timeout: Duration,
    /// Retry policy for transient store failures
    pub retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Set the per-call store timeout.
    #[must_use]
    pub const fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
