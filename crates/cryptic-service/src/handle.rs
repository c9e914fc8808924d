//! Outbound operations available to handlers.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use cryptic_wire::{EndpointPath, Frame, Payload, Tag};

use crate::pending::PendingCalls;
use crate::user::UserRecord;

const HANDLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handle");

/// Failures of a correlated outbound call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    /// No response arrived before the deadline, or the call was cancelled.
    #[error("no response for call {tag} within {waited:?}")]
    NoResponse {
        /// Tag of the abandoned call.
        tag: Tag,
        /// Deadline that elapsed.
        waited: Duration,
    },
    /// The outbound queue is closed because the service is shutting down.
    #[error("service connection is closed")]
    Disconnected,
}

/// Failure to queue a fire-and-forget frame.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The outbound queue is closed because the service is shutting down.
    #[error("service connection is closed")]
    Closed,
}

/// Cloneable handle for talking to the hub from handlers and service code.
///
/// Frames are queued for the connection's single writer. While the hub
/// connection is down they wait in the queue and are written after the next
/// registration.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    outbound: mpsc::Sender<Frame>,
    pending: Arc<PendingCalls>,
    call_timeout: Duration,
}

impl ServiceHandle {
    pub(crate) const fn new(
        outbound: mpsc::Sender<Frame>,
        pending: Arc<PendingCalls>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            outbound,
            pending,
            call_timeout,
        }
    }

    /// Deadline applied by [`ServiceHandle::call_microservice`].
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Calls `endpoint` on the microservice `name` and waits for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::NoResponse`] when no reply arrives within the
    /// configured call timeout and [`CallError::Disconnected`] when the
    /// service is shutting down.
    pub async fn call_microservice(
        &self,
        name: &str,
        endpoint: impl Into<EndpointPath>,
        data: Payload,
    ) -> Result<Payload, CallError> {
        self.call_microservice_within(name, endpoint, data, self.call_timeout)
            .await
    }

    /// Like [`ServiceHandle::call_microservice`] with an explicit deadline.
    ///
    /// # Errors
    ///
    /// As for [`ServiceHandle::call_microservice`].
    pub async fn call_microservice_within(
        &self,
        name: &str,
        endpoint: impl Into<EndpointPath>,
        data: Payload,
        timeout: Duration,
    ) -> Result<Payload, CallError> {
        let endpoint = endpoint.into();
        self.exchange(|tag| Frame::call(name, endpoint, data, tag), timeout)
            .await
    }

    /// Asks the hub for the account record of `user`.
    ///
    /// Returns `None` when the hub does not answer in time, reports the user
    /// as invalid, or answers with an incomplete record.
    pub async fn fetch_user(&self, user: Uuid) -> Option<UserRecord> {
        let lookup = self
            .exchange(|tag| Frame::user_lookup(user, tag), self.call_timeout)
            .await;
        match lookup {
            Ok(data) => UserRecord::from_lookup(&data),
            Err(error) => {
                debug!(target: HANDLE_TARGET, %user, %error, "user lookup unanswered");
                None
            }
        }
    }

    /// Returns `true` when the hub knows `user` as a valid account.
    pub async fn is_valid_user(&self, user: Uuid) -> bool {
        self.fetch_user(user).await.is_some()
    }

    /// Pushes `data` to the connected end user `user`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Closed`] when the service is shutting down.
    pub async fn send_to_user(&self, user: Uuid, data: Payload) -> Result<(), SendError> {
        self.outbound
            .send(Frame::address(user, data))
            .await
            .map_err(|_| SendError::Closed)
    }

    /// Queues the frame built for a fresh tag and waits for its response.
    ///
    /// `timeout` bounds the whole exchange, including time spent waiting for
    /// room in a full outbound queue.
    async fn exchange<F>(&self, frame: F, timeout: Duration) -> Result<Payload, CallError>
    where
        F: FnOnce(Tag) -> Frame,
    {
        let call = self.pending.register();
        let tag = call.tag();
        let exchange = async {
            self.outbound
                .send(frame(tag))
                .await
                .map_err(|_| CallError::Disconnected)?;
            call.wait(timeout).await
        };
        tokio::time::timeout(timeout, exchange)
            .await
            .unwrap_or_else(|_| {
                debug!(target: HANDLE_TARGET, %tag, ?timeout, "no response before deadline");
                Err(CallError::NoResponse {
                    tag,
                    waited: timeout,
                })
            })
    }
}
