//! Structured health reporting for service lifecycle events.

use std::sync::Arc;
use std::time::Duration;

use cryptic_config::Config;

use crate::bootstrap::BootstrapError;
use crate::transport::TransportError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before each connection attempt to the hub.
    fn connecting(&self, address: &str);

    /// Invoked once the registration frame has been written.
    fn connected(&self, address: &str);

    /// Invoked when a connection attempt fails or an established connection
    /// drops.
    fn disconnected(&self, error: &TransportError);

    /// Invoked before waiting out the reconnect delay.
    fn reconnect_scheduled(&self, delay: Duration);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn connecting(&self, address: &str) {
        (**self).connecting(address);
    }

    fn connected(&self, address: &str) {
        (**self).connected(address);
    }

    fn disconnected(&self, error: &TransportError) {
        (**self).disconnected(error);
    }

    fn reconnect_scheduled(&self, delay: Duration) {
        (**self).reconnect_scheduled(delay);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting service bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            service = config.service_name(),
            hub = %config.hub_address(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "service bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "service bootstrap failed"
        );
    }

    fn connecting(&self, address: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "connecting",
            hub = address,
            "connecting to hub"
        );
    }

    fn connected(&self, address: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "connected",
            hub = address,
            "registered with hub"
        );
    }

    fn disconnected(&self, error: &TransportError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "disconnected",
            error = %error,
            "hub connection lost"
        );
    }

    fn reconnect_scheduled(&self, delay: Duration) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "reconnect_scheduled",
            delay_secs = delay.as_secs(),
            "reconnecting to hub after delay"
        );
    }
}
