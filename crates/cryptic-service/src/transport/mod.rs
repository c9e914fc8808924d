//! Persistent connection to the routing hub.
//!
//! The connection task dials the hub, writes the registration frame, then
//! reads and writes envelopes until the socket fails. It then waits a fixed
//! delay and starts over, forever. The outbound queue and the pending-call
//! table outlive individual sockets.

mod connection;
mod errors;

pub(crate) use self::connection::{Connection, ConnectionSettings};
pub use self::errors::TransportError;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
