//! Inbound envelope parsing.
//!
//! A field holding a value of the wrong shape is treated as absent. Only a
//! frame that is not a JSON object at all is an error.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{EndpointPath, Payload, Tag};

/// Errors raised when a frame cannot be read as an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The frame is not valid JSON.
    #[error("malformed JSON: {source}")]
    Malformed {
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The frame is valid JSON but not an object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON kind that was found instead.
        found: &'static str,
    },
}

/// One inbound JSON envelope with its recognised fields extracted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Correlation tag, when present and a valid UUID.
    pub tag: Option<Tag>,
    /// Control action string.
    pub action: Option<String>,
    /// Object payload.
    pub data: Option<Payload>,
    /// Target path, when present and made only of strings.
    pub endpoint: Option<EndpointPath>,
    /// Originating end user, when present and a valid UUID.
    pub user: Option<Uuid>,
    /// Originating or destination microservice.
    pub ms: Option<String>,
    /// Whether the envelope carries a top-level `error` notice.
    pub error_notice: bool,
}

impl Envelope {
    /// Parses a raw frame into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] for invalid JSON and
    /// [`EnvelopeError::NotAnObject`] for any other top-level JSON value.
    pub fn parse(frame: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_slice(frame).map_err(|source| EnvelopeError::Malformed { source })?;
        match value {
            Value::Object(object) => Ok(Self::from_object(&object)),
            other => Err(EnvelopeError::NotAnObject {
                found: kind_name(&other),
            }),
        }
    }

    /// Extracts the recognised fields from a JSON object.
    #[must_use]
    pub fn from_object(object: &Payload) -> Self {
        Self {
            tag: object.get("tag").and_then(uuid_field).map(Tag::from_uuid),
            action: string_field(object.get("action")),
            data: object.get("data").and_then(Value::as_object).cloned(),
            endpoint: object.get("endpoint").and_then(path_field),
            user: object.get("user").and_then(uuid_field),
            ms: string_field(object.get("ms")),
            error_notice: object.get("error").is_some_and(|value| !value.is_null()),
        }
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_owned)
}

fn uuid_field(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|text| Uuid::parse_str(text).ok())
}

fn path_field(value: &Value) -> Option<EndpointPath> {
    let segments = value.as_array()?;
    segments
        .iter()
        .map(|segment| segment.as_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .map(EndpointPath::from)
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
