//! Wire vocabulary shared by the hub connection and the dispatcher.
//!
//! Every message exchanged with the routing hub is a single JSON object (an
//! *envelope*). This crate owns the pieces that have no runtime behaviour of
//! their own:
//!
//! - [`Tag`]: the random correlation identifier linking a call to its reply.
//! - [`EndpointPath`]: the ordered path segments naming a handler.
//! - [`ErrorCode`]: the four protocol error codes and their payload shape.
//! - [`Envelope`]: lenient parsing of inbound objects.
//! - [`Frame`]: the canonical outbound envelopes.
//! - [`JsonObjectCodec`]: a `tokio_util` codec that cuts a byte stream into
//!   top-level JSON values regardless of TCP segment boundaries.

mod codec;
mod endpoint;
mod envelope;
mod error_code;
mod frame;
mod tag;

pub use codec::{CodecError, JsonObjectCodec, MAX_FRAME_BYTES};
pub use endpoint::EndpointPath;
pub use envelope::{Envelope, EnvelopeError};
pub use error_code::ErrorCode;
pub use frame::{Action, Frame};
pub use tag::Tag;

/// JSON object payload carried in the `data` field of an envelope.
pub type Payload = serde_json::Map<String, serde_json::Value>;
