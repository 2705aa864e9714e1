//! Store wrapper adding per-call timeouts and transient-failure retries.
//!
//! Every call is bounded by [`CoordinatorConfig::store_timeout`]. A call that
//! times out fails with [`StoreError::Timeout`] and is not retried; only
//! [`StoreError::Transient`] goes back through the [`RetryPolicy`].
//!
//! Retrying `put_registration` and `delete_registration` is safe because both
//! are idempotent on their `(event_id, user_id)` key.

use crate::config::CoordinatorConfig;
use crate::retry::{RetryPolicy, retry_transient};
use registration_core::error::StoreError;
use registration_core::store::{EntityStore, StoreFuture};
use registration_core::types::{Event, EventId, Registration, UserId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// [`EntityStore`] decorator applying timeouts and retries.
#[derive(Clone)]
pub struct GuardedStore {
    inner: Arc<dyn EntityStore>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl std::fmt::Debug for GuardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedStore")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl GuardedStore {
    /// Wrap `inner` using the timeout and retry policy from `config`.
    #[must_use]
    pub fn new(inner: Arc<dyn EntityStore>, config: &CoordinatorConfig) -> Self {
        Self {
            inner,
            timeout: config.store_timeout,
            retry: config.retry.clone(),
        }
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tracing::debug!(operation, "Store call");
        if let Ok(result) = tokio::time::timeout(self.timeout, call).await {
            result
        } else {
            tracing::warn!(
                operation,
                timeout_ms = self.timeout.as_millis(),
                "Store call timed out"
            );
            Err(StoreError::Timeout(self.timeout))
        }
    }
}

impl EntityStore for GuardedStore {
    fn get_event<'a>(&'a self, event_id: &'a EventId) -> StoreFuture<'a, Option<Event>> {
        Box::pin(retry_transient(&self.retry, "get_event", move || {
            self.timed("get_event", self.inner.get_event(event_id))
        }))
    }

    fn user_exists<'a>(&'a self, user_id: &'a UserId) -> StoreFuture<'a, bool> {
        Box::pin(retry_transient(&self.retry, "user_exists", move || {
            self.timed("user_exists", self.inner.user_exists(user_id))
        }))
    }

    fn get_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Option<Registration>> {
        Box::pin(retry_transient(&self.retry, "get_registration", move || {
            self.timed(
                "get_registration",
                self.inner.get_registration(event_id, user_id),
            )
        }))
    }

    fn put_registration(&self, registration: Registration) -> StoreFuture<'_, ()> {
        Box::pin(retry_transient(&self.retry, "put_registration", move || {
            self.timed(
                "put_registration",
                self.inner.put_registration(registration.clone()),
            )
        }))
    }

    fn delete_registration<'a>(
        &'a self,
        event_id: &'a EventId,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, ()> {
        Box::pin(retry_transient(&self.retry, "delete_registration", move || {
            self.timed(
                "delete_registration",
                self.inner.delete_registration(event_id, user_id),
            )
        }))
    }

    fn list_registrations_for_event<'a>(
        &'a self,
        event_id: &'a EventId,
    ) -> StoreFuture<'a, Vec<Registration>> {
        Box::pin(retry_transient(
            &self.retry,
            "list_registrations_for_event",
            move || {
                self.timed(
                    "list_registrations_for_event",
                    self.inner.list_registrations_for_event(event_id),
                )
            },
        ))
    }

    fn list_registrations_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> StoreFuture<'a, Vec<Registration>> {
        Box::pin(retry_transient(
            &self.retry,
            "list_registrations_for_user",
            move || {
                self.timed(
                    "list_registrations_for_user",
                    self.inner.list_registrations_for_user(user_id),
                )
            },
        ))
    }
}
