//! Error types for the hub connection.

use std::io;

use thiserror::Error;

use cryptic_wire::CodecError;

/// Reasons a hub connection ended. None of them are fatal: the connection
/// loop reports the error and reconnects after the configured delay.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("failed to connect to hub at {address}: {source}")]
    Connect {
        /// Hub address that was dialled.
        address: String,
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// Reading or framing inbound bytes failed.
    #[error("failed to read from hub: {source}")]
    Read {
        /// Codec failure.
        #[source]
        source: CodecError,
    },
    /// Writing an outbound frame failed.
    #[error("failed to write to hub: {source}")]
    Write {
        /// Codec failure.
        #[source]
        source: CodecError,
    },
    /// The hub closed the connection.
    #[error("hub closed the connection")]
    Closed,
    /// Every sender of the outbound queue has been dropped.
    #[error("outbound queue closed")]
    QueueClosed,
}
