//! # Registration Service
//!
//! Wires the registration coordinator to configuration, an entity store and
//! the Prometheus exporter.
//!
//! The in-memory store stands in for the external event and user catalog;
//! events and users are seeded through [`RegistrationApp::add_event`] and
//! [`RegistrationApp::add_user`].
//!
//! ## Example
//!
//! ```rust
//! use registration_service::{Config, RegistrationApp};
//! use registration_core::types::{Capacity, Event, EventId, User, UserId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = RegistrationApp::new(Config::default())?;
//! let capacity = Capacity::new(2).ok_or("capacity must be positive")?;
//! app.add_event(Event::new(EventId::new("e1"), "Meetup", capacity).with_waitlist());
//! app.add_user(User::new(UserId::new("u1"), "Ada"));
//!
//! let registration = app.coordinator().register(&EventId::new("e1"), &UserId::new("u1")).await?;
//! assert!(registration.is_registered());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;

pub use config::Config;
pub use error::ServiceError;

use registration_core::environment::{Clock, SystemClock};
use registration_core::types::{Event, User};
use registration_runtime::{MetricsServer, RegistrationCoordinator};
use registration_testing::InMemoryEntityStore;
use std::sync::Arc;

/// Registration service: coordinator, backing store and metrics.
pub struct RegistrationApp {
    config: Config,
    store: InMemoryEntityStore,
    coordinator: RegistrationCoordinator,
    metrics: Option<MetricsServer>,
}

impl RegistrationApp {
    /// Build the service over a fresh in-memory store and the system clock.
    ///
    /// Starts the metrics exporter when `config.metrics.enabled`, which
    /// requires a running Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the metrics address is invalid or the
    /// exporter cannot be built.
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        Self::with_parts(config, InMemoryEntityStore::new(), Arc::new(SystemClock))
    }

    /// Build the service over the given store and clock.
    ///
    /// # Errors
    ///
    /// Same as [`RegistrationApp::new`].
    pub fn with_parts(
        config: Config,
        store: InMemoryEntityStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        let metrics = if config.metrics.enabled {
            let mut server = MetricsServer::new(config.metrics_addr()?);
            server.start()?;
            Some(server)
        } else {
            tracing::debug!("Metrics exporter disabled");
            None
        };

        let coordinator =
            RegistrationCoordinator::new(Arc::new(store.clone()), clock, &config.coordinator_config());

        tracing::info!(
            store_timeout_ms = config.store.timeout_ms,
            max_retries = config.store.max_retries,
            metrics = config.metrics.enabled,
            "Registration service initialized"
        );

        Ok(Self {
            config,
            store,
            coordinator,
            metrics,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The coordinator serving register, unregister and status calls.
    #[must_use]
    pub const fn coordinator(&self) -> &RegistrationCoordinator {
        &self.coordinator
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &InMemoryEntityStore {
        &self.store
    }

    /// Add or replace an event in the catalog.
    pub fn add_event(&self, event: Event) {
        tracing::debug!(event_id = %event.id, capacity = %event.capacity, "Event added");
        self.store.insert_event(event);
    }

    /// Add or replace a user.
    pub fn add_user(&self, user: User) {
        self.store.insert_user(user);
    }

    /// Current metrics in Prometheus text format, if the exporter is running.
    #[must_use]
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().and_then(MetricsServer::render)
    }
}
