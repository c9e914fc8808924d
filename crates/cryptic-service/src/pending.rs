//! Correlation of outbound calls with their responses.
//!
//! Each outbound call owns a fill-once slot keyed by a fresh [`Tag`]. The
//! slot is removed the moment it is filled, times out, or its waiter is
//! dropped, so a response that arrives afterwards finds nothing and is
//! discarded.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::oneshot;
use tracing::debug;

use cryptic_wire::{Payload, Tag};

use crate::handle::CallError;

const PENDING_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::pending");

/// Concurrent table of unresolved outbound calls.
#[derive(Debug, Default)]
pub(crate) struct PendingCalls {
    slots: DashMap<Tag, oneshot::Sender<Payload>>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers an empty slot under a tag not currently in use.
    pub(crate) fn register(self: &Arc<Self>) -> PendingCall {
        let (sender, receiver) = oneshot::channel();
        let tag = loop {
            let candidate = Tag::fresh();
            if let Entry::Vacant(entry) = self.slots.entry(candidate) {
                entry.insert(sender);
                break candidate;
            }
        };
        PendingCall {
            tag,
            receiver,
            table: Arc::clone(self),
        }
    }

    /// Returns `true` while `tag` awaits a response.
    pub(crate) fn contains(&self, tag: &Tag) -> bool {
        self.slots.contains_key(tag)
    }

    /// Fills the slot for `tag`, returning `false` when nothing was waiting.
    pub(crate) fn resolve(&self, tag: Tag, data: Payload) -> bool {
        let Some((_, sender)) = self.slots.remove(&tag) else {
            debug!(target: PENDING_TARGET, %tag, "discarding response for unknown tag");
            return false;
        };
        if sender.send(data).is_err() {
            debug!(target: PENDING_TARGET, %tag, "caller stopped waiting before the response");
            return false;
        }
        true
    }

    /// Number of calls still waiting.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Waiting side of a registered call.
///
/// Dropping the value removes the slot.
#[derive(Debug)]
pub(crate) struct PendingCall {
    tag: Tag,
    receiver: oneshot::Receiver<Payload>,
    table: Arc<PendingCalls>,
}

impl PendingCall {
    pub(crate) const fn tag(&self) -> Tag {
        self.tag
    }

    /// Waits up to `timeout` for the slot to be filled.
    pub(crate) async fn wait(mut self, timeout: Duration) -> Result<Payload, CallError> {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(_)) | Err(_) => {
                debug!(target: PENDING_TARGET, tag = %self.tag, ?timeout, "no response before deadline");
                Err(CallError::NoResponse {
                    tag: self.tag,
                    waited: timeout,
                })
            }
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.table.slots.remove(&self.tag);
    }
}
