//! Protocol error codes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Payload;

/// Error codes produced by the core protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The inbound frame was not a JSON object.
    UnsupportedFormat,
    /// A required envelope field or handler parameter was absent or mistyped.
    MissingParameters,
    /// The handler failed unexpectedly.
    InternalError,
    /// No handler is registered for the requested path.
    UnknownService,
}

impl ErrorCode {
    /// Returns the wire spelling of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::MissingParameters => "missing_parameters",
            Self::InternalError => "internal_error",
            Self::UnknownService => "unknown_service",
        }
    }

    /// Builds the `{"error": "<code>"}` payload nested inside `data`.
    #[must_use]
    pub fn payload(self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("error".to_owned(), Value::from(self.as_str()));
        payload
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
