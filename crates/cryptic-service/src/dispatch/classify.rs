//! Classification of inbound envelopes.
//!
//! Rules are applied in priority order and every frame lands in exactly one
//! [`Classification`]:
//!
//! 1. not a JSON object: rejected with `unsupported_format`;
//! 2. `tag` or `data` absent: rejected with `missing_parameters`;
//! 3. `tag` pending and no `endpoint`: response to an outbound call;
//! 4. `user` present: request from an end user;
//! 5. `ms` present and `tag` not pending: request from another service;
//! 6. anything else: response, discarded when nothing is pending.

use uuid::Uuid;

use cryptic_wire::{EndpointPath, Envelope, Frame, Payload, Tag};

use crate::pending::PendingCalls;

use super::errors::DispatchError;

/// Routing decision for one inbound frame.
#[derive(Debug)]
pub(crate) enum Classification {
    Rejected(Rejection),
    Response { tag: Tag, data: Payload },
    UserRequest(Request<Uuid>),
    ServiceRequest(Request<String>),
}

/// A frame that fails before any handler is considered.
#[derive(Debug)]
pub(crate) struct Rejection {
    pub(crate) tag: Option<Tag>,
    pub(crate) error: DispatchError,
    /// The frame itself was an error notice and must not be answered with
    /// another one.
    pub(crate) quiet: bool,
}

impl Rejection {
    /// Frame that reports the rejection to the peer, if one should be sent.
    pub(crate) fn reply(&self) -> Option<Frame> {
        let code = self.error.code();
        match self.tag {
            Some(tag) => Some(Frame::reply(tag, code.payload())),
            None if self.quiet => None,
            None => Some(Frame::notice(code)),
        }
    }
}

/// A request addressed to a local handler.
#[derive(Debug)]
pub(crate) struct Request<C> {
    pub(crate) tag: Tag,
    pub(crate) caller: C,
    pub(crate) endpoint: Option<EndpointPath>,
    pub(crate) data: Payload,
}

pub(crate) fn classify(frame: &[u8], pending: &PendingCalls) -> Classification {
    let envelope = match Envelope::parse(frame) {
        Ok(envelope) => envelope,
        Err(source) => {
            return Classification::Rejected(Rejection {
                tag: None,
                error: DispatchError::UnsupportedFormat { source },
                quiet: false,
            });
        }
    };

    let Envelope {
        tag,
        data,
        endpoint,
        user,
        ms,
        error_notice,
        ..
    } = envelope;

    let (tag, data) = match (tag, data) {
        (Some(tag), Some(data)) => (tag, data),
        (tag, data) => {
            let field = if tag.is_none() { "tag" } else { "data" };
            return Classification::Rejected(Rejection {
                tag,
                error: DispatchError::MissingEnvelopeField { field },
                quiet: error_notice,
            });
        }
    };

    let is_pending = pending.contains(&tag);
    if is_pending && endpoint.is_none() {
        return Classification::Response { tag, data };
    }

    if let Some(user) = user {
        return Classification::UserRequest(Request {
            tag,
            caller: user,
            endpoint,
            data,
        });
    }

    match ms {
        Some(ms) if !is_pending => Classification::ServiceRequest(Request {
            tag,
            caller: ms,
            endpoint,
            data,
        }),
        _ => Classification::Response { tag, data },
    }
}
