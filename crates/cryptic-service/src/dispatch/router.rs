//! Routing of classified envelopes to handlers.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, warn};

use cryptic_wire::{EndpointPath, Frame, Payload, Tag};

use crate::handle::ServiceHandle;
use crate::pending::PendingCalls;
use crate::registry::{Endpoint, EndpointRegistry, Invocation, Origin};

use super::DISPATCH_TARGET;
use super::classify::{Classification, Request, classify};
use super::errors::DispatchError;

/// Serves inbound envelopes against the registry and the pending table.
///
/// Cloning is cheap; every dispatch task holds its own copy.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    registry: Arc<EndpointRegistry>,
    pending: Arc<PendingCalls>,
    handle: ServiceHandle,
}

impl Dispatcher {
    pub(crate) const fn new(
        registry: Arc<EndpointRegistry>,
        pending: Arc<PendingCalls>,
        handle: ServiceHandle,
    ) -> Self {
        Self {
            registry,
            pending,
            handle,
        }
    }

    pub(crate) fn classify(&self, frame: &[u8]) -> Classification {
        classify(frame, &self.pending)
    }

    /// Fills the pending slot for `tag`; unmatched responses are dropped.
    pub(crate) fn resolve(&self, tag: Tag, data: Payload) {
        if !self.pending.resolve(tag, data) {
            debug!(target: DISPATCH_TARGET, %tag, "response matched no pending call");
        }
    }

    /// Classifies and serves one frame, returning the reply to send, if any.
    pub(crate) async fn dispatch(&self, frame: &[u8]) -> Option<Frame> {
        self.serve(self.classify(frame)).await
    }

    /// Serves an already classified frame.
    pub(crate) async fn serve(&self, classification: Classification) -> Option<Frame> {
        match classification {
            Classification::Rejected(rejection) => {
                warn!(
                    target: DISPATCH_TARGET,
                    tag = ?rejection.tag,
                    code = %rejection.error.code(),
                    error = %rejection.error,
                    "rejected inbound envelope"
                );
                rejection.reply()
            }
            Classification::Response { tag, data } => {
                self.resolve(tag, data);
                None
            }
            Classification::UserRequest(request) => {
                let tag = request.tag;
                let data = self
                    .invoke(Origin::User, request, |registry, path| {
                        registry.user_endpoint(path)
                    })
                    .await;
                Some(Frame::reply(tag, data))
            }
            Classification::ServiceRequest(request) => {
                let tag = request.tag;
                let caller = request.caller.clone();
                let data = self
                    .invoke(Origin::Service, request, |registry, path| {
                        registry.service_endpoint(path)
                    })
                    .await;
                Some(Frame::service_reply(caller, tag, data))
            }
        }
    }

    /// Answers a classified frame without running a handler.
    ///
    /// Used when the connection cannot admit another dispatch task. Requests
    /// get an `internal_error` reply; rejections keep their own reply.
    pub(crate) fn refuse(&self, classification: Classification) -> Option<Frame> {
        let (error, reply) = match classification {
            Classification::Response { tag, data } => {
                self.resolve(tag, data);
                return None;
            }
            Classification::Rejected(rejection) => return rejection.reply(),
            Classification::UserRequest(request) => {
                let error = DispatchError::Overloaded {
                    origin: Origin::User,
                    path: request.endpoint.unwrap_or_default(),
                };
                let reply = Frame::reply(request.tag, error.code().payload());
                (error, reply)
            }
            Classification::ServiceRequest(request) => {
                let error = DispatchError::Overloaded {
                    origin: Origin::Service,
                    path: request.endpoint.unwrap_or_default(),
                };
                let reply =
                    Frame::service_reply(request.caller, request.tag, error.code().payload());
                (error, reply)
            }
        };
        warn!(target: DISPATCH_TARGET, tag = ?reply.tag(), %error, "request refused");
        Some(reply)
    }

    /// Runs the handler for `request`, folding every failure into an error
    /// payload.
    async fn invoke<C, L>(&self, origin: Origin, request: Request<C>, lookup: L) -> Payload
    where
        C: Send + 'static,
        L: for<'r> FnOnce(&'r EndpointRegistry, &EndpointPath) -> Option<&'r Endpoint<C>>,
    {
        let Request {
            tag,
            caller,
            endpoint,
            data,
        } = request;
        let path = endpoint.unwrap_or_default();

        match self.run(origin, &path, caller, data, lookup).await {
            Ok(payload) => {
                debug!(target: DISPATCH_TARGET, %tag, %origin, %path, "request served");
                payload
            }
            Err(error) => {
                if !matches!(error, DispatchError::InternalError { .. }) {
                    debug!(
                        target: DISPATCH_TARGET,
                        %tag,
                        code = %error.code(),
                        %error,
                        "request rejected"
                    );
                }
                error.code().payload()
            }
        }
    }

    async fn run<C, L>(
        &self,
        origin: Origin,
        path: &EndpointPath,
        caller: C,
        data: Payload,
        lookup: L,
    ) -> Result<Payload, DispatchError>
    where
        C: Send + 'static,
        L: for<'r> FnOnce(&'r EndpointRegistry, &EndpointPath) -> Option<&'r Endpoint<C>>,
    {
        let Some(endpoint) = lookup(&self.registry, path) else {
            return Err(DispatchError::UnknownService {
                origin,
                path: path.clone(),
            });
        };
        if let Err(mismatch) = endpoint.descriptor().validate(&data) {
            return Err(DispatchError::MissingParameters {
                origin,
                path: path.clone(),
                mismatch,
            });
        }

        let handler = endpoint.handler();
        let invocation = Invocation::new(data, caller, self.handle.clone());
        let outcome = AssertUnwindSafe(async move { handler(invocation).await })
            .catch_unwind()
            .await;

        let message = match outcome {
            Ok(Ok(payload)) => return Ok(payload),
            Ok(Err(fault)) => {
                error!(
                    target: DISPATCH_TARGET,
                    %origin,
                    %path,
                    error = ?fault,
                    "endpoint handler failed"
                );
                format!("{fault:#}")
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    target: DISPATCH_TARGET,
                    %origin,
                    %path,
                    panic = %message,
                    "endpoint handler panicked"
                );
                message
            }
        };
        Err(DispatchError::InternalError {
            origin,
            path: path.clone(),
            message,
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
