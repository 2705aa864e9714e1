//! Prometheus metrics for the registration coordinator.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`MetricsServer`] installs the Prometheus exporter
//! and serves the scrape endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use registration_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use registration_core::error::RegistrationError;
use registration_core::types::RegistrationStatus;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Admissions, labelled by `status`.
pub const ADMISSIONS_TOTAL: &str = "registration_admissions_total";
/// Rejected operations, labelled by `reason`.
pub const REJECTIONS_TOTAL: &str = "registration_rejections_total";
/// Waitlist promotions.
pub const PROMOTIONS_TOTAL: &str = "registration_promotions_total";
/// Successful unregisters, labelled by the removed `status`.
pub const UNREGISTRATIONS_TOTAL: &str = "registration_unregistrations_total";
/// Store call retries, labelled by `operation`.
pub const STORE_RETRIES_TOTAL: &str = "registration_store_retries_total";
/// Store calls that ran out of retries, labelled by `operation`.
pub const STORE_RETRIES_EXHAUSTED_TOTAL: &str = "registration_store_retries_exhausted_total";
/// Time spent waiting for an event permit.
pub const LOCK_WAIT_SECONDS: &str = "registration_lock_wait_seconds";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
}

/// Prometheus exporter with an HTTP scrape endpoint.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server bound to `addr` once started.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe the coordinator metrics, install the global recorder and
    /// spawn the scrape listener.
    ///
    /// Must be called from within a Tokio runtime. If another recorder is
    /// already installed the call logs a warning, leaves
    /// [`MetricsServer::handle`] empty and succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if the exporter cannot be built.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("_seconds".to_string()),
                &[0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
            return Ok(());
        }
        describe_metrics();

        tokio::spawn(async move {
            if exporter.await.is_err() {
                tracing::error!("Metrics listener stopped");
            }
        });

        self.handle = Some(handle);
        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register descriptions for every coordinator metric.
pub fn describe_metrics() {
    describe_counter!(ADMISSIONS_TOTAL, "Registrations admitted, by resulting status");
    describe_counter!(REJECTIONS_TOTAL, "Operations rejected, by reason");
    describe_counter!(PROMOTIONS_TOTAL, "Waitlisted users promoted to registered");
    describe_counter!(UNREGISTRATIONS_TOTAL, "Registrations removed, by previous status");
    describe_counter!(STORE_RETRIES_TOTAL, "Store calls retried after a transient failure");
    describe_counter!(
        STORE_RETRIES_EXHAUSTED_TOTAL,
        "Store calls that failed after exhausting retries"
    );
    describe_histogram!(LOCK_WAIT_SECONDS, "Time spent waiting for an event permit");
}

/// Coordinator metrics recorder.
pub struct CoordinatorMetrics;

impl CoordinatorMetrics {
    /// Record an admission.
    pub fn record_admission(status: RegistrationStatus) {
        counter!(ADMISSIONS_TOTAL, "status" => status.as_str()).increment(1);
    }

    /// Record a rejected operation.
    pub fn record_rejection(error: &RegistrationError) {
        counter!(REJECTIONS_TOTAL, "reason" => error.reason()).increment(1);
    }

    /// Record a waitlist promotion.
    pub fn record_promotion() {
        counter!(PROMOTIONS_TOTAL).increment(1);
    }

    /// Record a removed registration.
    pub fn record_unregistration(previous: RegistrationStatus) {
        counter!(UNREGISTRATIONS_TOTAL, "status" => previous.as_str()).increment(1);
    }

    /// Record a store retry.
    pub fn record_retry(operation: &'static str) {
        counter!(STORE_RETRIES_TOTAL, "operation" => operation).increment(1);
    }

    /// Record a store call that ran out of retries.
    pub fn record_retry_exhausted(operation: &'static str) {
        counter!(STORE_RETRIES_EXHAUSTED_TOTAL, "operation" => operation).increment(1);
    }

    /// Record time spent waiting for an event permit.
    pub fn record_lock_wait(waited: Duration) {
        histogram!(LOCK_WAIT_SECONDS).record(waited.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;
    use registration_core::types::EventId;

    fn render_with(record: impl FnOnce()) -> String {
        let recorder: PrometheusRecorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, record);
        handle.render()
    }

    #[test]
    fn test_metrics_server_creation() {
        let server = MetricsServer::new(SocketAddr::from(([127, 0, 0, 1], 0)));
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn test_metrics_server_start_installs_exporter() {
        let mut server = MetricsServer::new(SocketAddr::from(([127, 0, 0, 1], 0)));

        server.start().unwrap();
        CoordinatorMetrics::record_promotion();

        // Only the first recorder installed in this process gets a handle.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains(PROMOTIONS_TOTAL));
        }
    }

    #[test]
    fn test_admission_and_promotion_counters() {
        let rendered = render_with(|| {
            CoordinatorMetrics::record_admission(RegistrationStatus::Registered);
            CoordinatorMetrics::record_admission(RegistrationStatus::Waitlisted);
            CoordinatorMetrics::record_promotion();
        });

        assert!(rendered.contains(r#"registration_admissions_total{status="registered"} 1"#));
        assert!(rendered.contains(r#"registration_admissions_total{status="waitlisted"} 1"#));
        assert!(rendered.contains("registration_promotions_total 1"));
    }

    #[test]
    fn test_rejections_are_labelled_by_reason() {
        let rendered = render_with(|| {
            CoordinatorMetrics::record_rejection(&RegistrationError::CapacityExceeded {
                event_id: EventId::new("e1"),
            });
        });

        assert!(rendered.contains(r#"registration_rejections_total{reason="capacity_exceeded"} 1"#));
    }

    #[test]
    fn test_lock_wait_histogram() {
        let rendered = render_with(|| {
            CoordinatorMetrics::record_lock_wait(Duration::from_millis(3));
        });

        assert!(rendered.contains(LOCK_WAIT_SECONDS));
    }
}
