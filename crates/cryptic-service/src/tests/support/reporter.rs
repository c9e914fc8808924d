//! Test double for [`HealthReporter`] that records structured events for assertions.
//!
//! The recorder captures bootstrap and connection lifecycle telemetry so
//! behaviour tests can validate observable events.

use std::sync::Mutex;
use std::time::Duration;

use cryptic_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::transport::TransportError;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// A connection attempt to the given hub address began.
    Connecting(String),
    /// Registration was written to the given hub address.
    Connected(String),
    /// The connection ended with an error description.
    Disconnected(String),
    /// A reconnect was scheduled after the delay.
    ReconnectScheduled(Duration),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Number of recorded `connected` events.
    #[must_use]
    pub fn connections(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, HealthEvent::Connected(_)))
            .count()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn connecting(&self, address: &str) {
        self.record(HealthEvent::Connecting(address.to_owned()));
    }

    fn connected(&self, address: &str) {
        self.record(HealthEvent::Connected(address.to_owned()));
    }

    fn disconnected(&self, error: &TransportError) {
        self.record(HealthEvent::Disconnected(error.to_string()));
    }

    fn reconnect_scheduled(&self, delay: Duration) {
        self.record(HealthEvent::ReconnectScheduled(delay));
    }
}
