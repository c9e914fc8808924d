//! Built-in defaults applied before environment and CLI layers.

/// Default hub address.
pub const DEFAULT_HUB_HOST: &str = "127.0.0.1";

/// Default hub port.
pub const DEFAULT_HUB_PORT: u16 = 1239;

/// Default service name announced in the registration frame.
pub const DEFAULT_SERVICE_NAME: &str = "template";

/// Default log filter expression used by the service binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Fixed delay between a lost connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 10;

/// Deadline applied to outbound calls awaiting a correlated response.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Maximum number of inbound envelopes processed concurrently.
pub const DEFAULT_DISPATCH_CONCURRENCY: usize = 64;

/// Owned hub host used where allocation is required (e.g. serde).
pub fn default_hub_host() -> String {
    DEFAULT_HUB_HOST.to_string()
}

/// Owned service name used where allocation is required.
pub fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
