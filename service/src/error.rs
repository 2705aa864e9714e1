//! Service-level errors.

use registration_core::error::RegistrationError;
use registration_runtime::metrics::MetricsError;
use thiserror::Error;

/// Errors raised while bootstrapping or driving the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration value could not be used
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics exporter failed to start
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// A registration operation failed
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}
