//! Values handed to endpoint handlers.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use cryptic_wire::Payload;

use crate::handle::ServiceHandle;

/// Outcome of a handler: the reply payload, or a fault that is logged and
/// reported to the caller as `internal_error`.
pub type HandlerResult = anyhow::Result<Payload>;

/// A single request delivered to a handler.
///
/// `C` is the caller identity: the end user's UUID for user endpoints, the
/// calling microservice's name for service endpoints.
#[derive(Debug, Clone)]
pub struct Invocation<C> {
    data: Payload,
    caller: C,
    handle: ServiceHandle,
}

impl<C> Invocation<C> {
    pub(crate) const fn new(data: Payload, caller: C, handle: ServiceHandle) -> Self {
        Self {
            data,
            caller,
            handle,
        }
    }

    /// Request payload, already validated against the endpoint descriptor.
    #[must_use]
    pub const fn data(&self) -> &Payload {
        &self.data
    }

    /// Who sent the request.
    #[must_use]
    pub const fn caller(&self) -> &C {
        &self.caller
    }

    /// Handle for calling other services or the hub.
    #[must_use]
    pub const fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Splits the invocation into payload, caller and handle.
    #[must_use]
    pub fn into_parts(self) -> (Payload, C, ServiceHandle) {
        (self.data, self.caller, self.handle)
    }

    /// String value of `key`, if present and a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(serde_json::Value::as_str)
    }
}

pub(crate) type BoxedHandler<C> =
    Arc<dyn Fn(Invocation<C>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

pub(crate) fn boxed<C, F, Fut>(handler: F) -> BoxedHandler<C>
where
    F: Fn(Invocation<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |invocation| handler(invocation).boxed())
}
