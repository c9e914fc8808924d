//! Inbound envelope dispatch.
//!
//! Every frame decoded from the hub connection is classified independently
//! and then either fills a pending outbound call or runs a registered
//! handler. Handler results become reply frames:
//!
//! ```json
//! {"tag":"<uuid>","data":{"pong":true}}
//! {"ms":"<caller>","data":{"owner":"<uuid>"},"tag":"<uuid>"}
//! ```
//!
//! Failures are reported with the protocol error codes, nested in `data` when
//! the frame carried a tag and as a top-level notice otherwise:
//!
//! ```json
//! {"tag":"<uuid>","data":{"error":"unknown_service"}}
//! {"error":"unsupported_format"}
//! ```

mod classify;
mod errors;
mod router;

pub(crate) use self::classify::Classification;
pub use self::errors::DispatchError;
pub(crate) use self::router::Dispatcher;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
