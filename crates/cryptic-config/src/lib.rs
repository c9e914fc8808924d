//! Shared configuration for hub-connected microservices.
//!
//! Values are layered by [`ortho_config`]: built-in defaults first, then
//! `CRYPTIC_*` environment variables, then command-line flags. The resolved
//! [`Config`] is immutable for the lifetime of the process and is handed to
//! the runtime during bootstrap.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_DISPATCH_CONCURRENCY, DEFAULT_HUB_HOST, DEFAULT_HUB_PORT,
    DEFAULT_LOG_FILTER, DEFAULT_RECONNECT_DELAY_SECS, DEFAULT_SERVICE_NAME, default_hub_host,
    default_log_filter, default_log_filter_string, default_log_format, default_service_name,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CRYPTIC")]
pub struct Config {
    /// Hostname or address of the routing hub.
    #[ortho_config(default = default_hub_host())]
    pub hub_host: String,
    /// TCP port of the routing hub.
    #[ortho_config(default = DEFAULT_HUB_PORT)]
    pub hub_port: u16,
    /// Name announced to the hub when registering.
    #[ortho_config(default = default_service_name())]
    pub service_name: String,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log lines.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Seconds to wait before reconnecting after the hub connection drops.
    #[ortho_config(default = DEFAULT_RECONNECT_DELAY_SECS)]
    pub reconnect_delay_secs: u64,
    /// Seconds an outbound call waits for its correlated response.
    #[ortho_config(default = DEFAULT_CALL_TIMEOUT_SECS)]
    pub call_timeout_secs: u64,
    /// Upper bound on concurrently dispatched inbound envelopes.
    #[ortho_config(default = DEFAULT_DISPATCH_CONCURRENCY)]
    pub dispatch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_host: default_hub_host(),
            hub_port: DEFAULT_HUB_PORT,
            service_name: default_service_name(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            dispatch_concurrency: DEFAULT_DISPATCH_CONCURRENCY,
        }
    }
}

impl Config {
    /// Hub address in `host:port` form, suitable for `TcpStream::connect`.
    #[must_use]
    pub fn hub_address(&self) -> String {
        format!("{}:{}", self.hub_host, self.hub_port)
    }

    /// Name announced in the registration frame.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Delay between a lost connection and the next attempt.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Deadline for outbound calls.
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Dispatch concurrency, never below one.
    #[must_use]
    pub fn dispatch_concurrency(&self) -> usize {
        self.dispatch_concurrency.max(1)
    }
}
