//! Runtime core for microservices attached to the routing hub.
//!
//! A service keeps one persistent TCP connection to the hub, announces itself
//! with a registration frame and then exchanges JSON envelopes for as long as
//! the process lives. Inbound envelopes are classified by the dispatcher and
//! either resolve a pending outbound call or invoke a handler registered in
//! the [`EndpointRegistry`]. Handlers reach back into the hub through the
//! [`ServiceHandle`] carried by every [`Invocation`].
//!
//! The crate also owns the ambient pieces a deployable service needs:
//! configuration loading and telemetry set-up in [`bootstrap_with`], and
//! lifecycle events surfaced through a [`HealthReporter`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cryptic_service::{
//!     RegistryBuilder, StructuredHealthReporter, SystemConfigLoader, bootstrap_with,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut registry = RegistryBuilder::new();
//! registry.register_user_endpoint(["ping"], &[], &[], |_invocation| async {
//!     Ok(serde_json::Map::new())
//! })?;
//!
//! let bootstrapped = bootstrap_with(&SystemConfigLoader, Arc::new(StructuredHealthReporter::new()))?;
//! bootstrapped.into_service(registry.build()).run().await;
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod dispatch;
mod handle;
mod health;
mod pending;
mod registry;
mod service;
pub mod telemetry;
mod transport;
mod user;

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use dispatch::DispatchError;
pub use handle::{CallError, SendError, ServiceHandle};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use registry::{
    EndpointDescriptor, EndpointRegistry, HandlerResult, Invocation, Origin, ParameterMismatch,
    RegistryBuilder, RegistryError, ValueKind,
};
pub use service::Service;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::TransportError;
pub use user::UserRecord;

pub use cryptic_wire::{EndpointPath, ErrorCode, Payload, Tag};

#[cfg(test)]
mod tests;
