//! Error types for envelope dispatch failures.
//!
//! Every variant maps onto one of the protocol [`ErrorCode`]s. The variant
//! carries the detail that ends up in the logs; the peer only ever sees the
//! code.

use thiserror::Error;

use cryptic_wire::{EndpointPath, EnvelopeError, ErrorCode};

use crate::registry::{Origin, ParameterMismatch};

/// Errors surfaced while classifying or serving an inbound envelope.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The frame is not a JSON object.
    #[error("unsupported format: {source}")]
    UnsupportedFormat {
        /// Parser failure.
        #[source]
        source: EnvelopeError,
    },
    /// The envelope lacks `tag` or `data`.
    #[error("envelope is missing its {field}")]
    MissingEnvelopeField {
        /// Name of the absent field.
        field: &'static str,
    },
    /// The payload does not satisfy the endpoint descriptor.
    #[error("{origin} endpoint {path}: {mismatch}")]
    MissingParameters {
        /// Table the endpoint lives in.
        origin: Origin,
        /// Requested path.
        path: EndpointPath,
        /// First unmet requirement.
        mismatch: ParameterMismatch,
    },
    /// No handler is registered for the path.
    #[error("no {origin} endpoint registered for {path}")]
    UnknownService {
        /// Table that was searched.
        origin: Origin,
        /// Requested path; empty when the envelope named none.
        path: EndpointPath,
    },
    /// The handler returned an error or panicked.
    #[error("{origin} endpoint {path} failed: {message}")]
    InternalError {
        /// Table the endpoint lives in.
        origin: Origin,
        /// Requested path.
        path: EndpointPath,
        /// Rendered fault.
        message: String,
    },
    /// Too many requests were already waiting for a dispatch slot.
    #[error("{origin} endpoint {path} refused: dispatch backlog is full")]
    Overloaded {
        /// Table the request was addressed to.
        origin: Origin,
        /// Requested path; empty when the envelope named none.
        path: EndpointPath,
    },
}

impl DispatchError {
    /// Protocol code reported to the peer.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            Self::MissingEnvelopeField { .. } | Self::MissingParameters { .. } => {
                ErrorCode::MissingParameters
            }
            Self::UnknownService { .. } => ErrorCode::UnknownService,
            Self::InternalError { .. } | Self::Overloaded { .. } => ErrorCode::InternalError,
        }
    }
}
