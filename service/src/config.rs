//! Configuration management for the registration service.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ServiceError;
use registration_runtime::{CoordinatorConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store access configuration
    pub store: StoreConfig,
    /// Metrics exporter configuration
    pub metrics: MetricsConfig,
    /// Log filter (trace, debug, info, warn, error or a full `EnvFilter` directive)
    pub log_level: String,
}

/// Store access configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Per-call timeout in milliseconds (default: 2000)
    pub timeout_ms: u64,
    /// Retries for transient failures (default: 2)
    pub max_retries: usize,
    /// Delay before the first retry in milliseconds (default: 25)
    pub retry_initial_delay_ms: u64,
    /// Cap on the retry delay in milliseconds (default: 500)
    pub retry_max_delay_ms: u64,
}

/// Metrics exporter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter (default: false)
    pub enabled: bool,
    /// Metrics server host (for Prometheus scraping)
    pub host: String,
    /// Metrics server port
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load `.env` (if present), then read the environment.
    #[must_use]
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_env()
    }

    /// Build configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            store: StoreConfig {
                timeout_ms: parsed(&lookup, "STORE_TIMEOUT_MS").unwrap_or(2000),
                max_retries: parsed(&lookup, "STORE_MAX_RETRIES").unwrap_or(2),
                retry_initial_delay_ms: parsed(&lookup, "STORE_RETRY_INITIAL_DELAY_MS").unwrap_or(25),
                retry_max_delay_ms: parsed(&lookup, "STORE_RETRY_MAX_DELAY_MS").unwrap_or(500),
            },
            metrics: MetricsConfig {
                enabled: parsed(&lookup, "METRICS_ENABLED").unwrap_or(false),
                host: lookup("METRICS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&lookup, "METRICS_PORT").unwrap_or(9090),
            },
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Coordinator tuning derived from the store settings.
    #[must_use]
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::default()
            .with_store_timeout(Duration::from_millis(self.store.timeout_ms))
            .with_retry(
                RetryPolicy::builder()
                    .max_retries(self.store.max_retries)
                    .initial_delay(Duration::from_millis(self.store.retry_initial_delay_ms))
                    .max_delay(Duration::from_millis(self.store.retry_max_delay_ms))
                    .build(),
            )
    }

    /// Address the metrics exporter binds to.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if host and port do not form a socket address.
    pub fn metrics_addr(&self) -> Result<SocketAddr, ServiceError> {
        let raw = format!("{}:{}", self.metrics.host, self.metrics.port);
        raw.parse()
            .map_err(|_| ServiceError::Config(format!("invalid metrics address: {raw}")))
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.store.timeout_ms, 2000);
        assert_eq!(config.store.max_retries, 2);
        assert!(!config.metrics.enabled);
        assert_eq!(config.metrics_addr().unwrap(), "0.0.0.0:9090".parse().unwrap());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config_from(&[
            ("STORE_TIMEOUT_MS", "150"),
            ("STORE_MAX_RETRIES", "not-a-number"),
            ("METRICS_ENABLED", "true"),
            ("METRICS_PORT", "9191"),
        ]);

        assert_eq!(config.store.timeout_ms, 150);
        assert_eq!(config.store.max_retries, 2);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9191);
    }

    #[test]
    fn test_coordinator_config() {
        let config = config_from(&[
            ("STORE_TIMEOUT_MS", "100"),
            ("STORE_MAX_RETRIES", "4"),
            ("STORE_RETRY_INITIAL_DELAY_MS", "5"),
        ]);

        let coordinator = config.coordinator_config();

        assert_eq!(coordinator.store_timeout, Duration::from_millis(100));
        assert_eq!(coordinator.retry.max_retries, 4);
        assert_eq!(coordinator.retry.initial_delay, Duration::from_millis(5));
        assert_eq!(coordinator.retry.max_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_metrics_host() {
        let config = config_from(&[("METRICS_HOST", "not a host")]);
        assert!(matches!(config.metrics_addr(), Err(ServiceError::Config(_))));
    }
}
