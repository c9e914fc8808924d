//! Canonical outbound envelopes.

use serde::Serialize;
use uuid::Uuid;

use crate::{EndpointPath, ErrorCode, Payload, Tag};

/// Hub-directed control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Announces the service to the hub.
    Register,
    /// Pushes data to a connected user.
    Address,
    /// Asks the hub for a user record.
    User,
}

/// An outbound envelope ready for encoding.
///
/// Each variant serialises to exactly one of the canonical frames, with its
/// fields in wire order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Frame {
    /// `{"action":"register","name":…}`, sent once per connection.
    Register {
        /// Always [`Action::Register`].
        action: Action,
        /// Service name.
        name: String,
    },
    /// `{"action":"address","user":…,"data":…}`.
    Address {
        /// Always [`Action::Address`].
        action: Action,
        /// Receiving user.
        user: Uuid,
        /// Pushed payload.
        data: Payload,
    },
    /// `{"action":"user","data":{"user":…},"tag":…}`.
    UserLookup {
        /// Always [`Action::User`].
        action: Action,
        /// Lookup request body.
        data: Payload,
        /// Correlation tag of the pending lookup.
        tag: Tag,
    },
    /// `{"ms":…,"data":…,"endpoint":[…],"tag":…}`.
    Call {
        /// Destination microservice.
        ms: String,
        /// Request payload.
        data: Payload,
        /// Destination handler path.
        endpoint: EndpointPath,
        /// Correlation tag of the pending call.
        tag: Tag,
    },
    /// `{"tag":…,"data":…}`, the answer to a user-originated request.
    Reply {
        /// Tag of the request being answered.
        tag: Tag,
        /// Response payload.
        data: Payload,
    },
    /// `{"ms":…,"data":…,"tag":…}`, the answer to a service-originated request.
    ServiceReply {
        /// Calling microservice.
        ms: String,
        /// Response payload.
        data: Payload,
        /// Tag of the request being answered.
        tag: Tag,
    },
    /// `{"error":…}`, a protocol error that cannot be addressed to a tag.
    Notice {
        /// Error code.
        error: ErrorCode,
    },
}

impl Frame {
    /// Registration frame for `name`.
    pub fn register(name: impl Into<String>) -> Self {
        Self::Register {
            action: Action::Register,
            name: name.into(),
        }
    }

    /// Push of `data` to `user`.
    #[must_use]
    pub const fn address(user: Uuid, data: Payload) -> Self {
        Self::Address {
            action: Action::Address,
            user,
            data,
        }
    }

    /// Hub lookup of `user`, correlated by `tag`.
    #[must_use]
    pub fn user_lookup(user: Uuid, tag: Tag) -> Self {
        let mut data = Payload::new();
        data.insert("user".to_owned(), user.to_string().into());
        Self::UserLookup {
            action: Action::User,
            data,
            tag,
        }
    }

    /// Call of `endpoint` on service `ms`, correlated by `tag`.
    pub fn call(ms: impl Into<String>, endpoint: EndpointPath, data: Payload, tag: Tag) -> Self {
        Self::Call {
            ms: ms.into(),
            data,
            endpoint,
            tag,
        }
    }

    /// Reply to a user-originated request.
    #[must_use]
    pub const fn reply(tag: Tag, data: Payload) -> Self {
        Self::Reply { tag, data }
    }

    /// Reply to a service-originated request from `ms`.
    pub fn service_reply(ms: impl Into<String>, tag: Tag, data: Payload) -> Self {
        Self::ServiceReply {
            ms: ms.into(),
            data,
            tag,
        }
    }

    /// Tagless protocol error notice.
    #[must_use]
    pub const fn notice(error: ErrorCode) -> Self {
        Self::Notice { error }
    }

    /// Correlation tag carried by the frame, if any.
    #[must_use]
    pub const fn tag(&self) -> Option<Tag> {
        match self {
            Self::UserLookup { tag, .. }
            | Self::Call { tag, .. }
            | Self::Reply { tag, .. }
            | Self::ServiceReply { tag, .. } => Some(*tag),
            Self::Register { .. } | Self::Address { .. } | Self::Notice { .. } => None,
        }
    }

    /// Payload carried in `data`, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&Payload> {
        match self {
            Self::Address { data, .. }
            | Self::UserLookup { data, .. }
            | Self::Call { data, .. }
            | Self::Reply { data, .. }
            | Self::ServiceReply { data, .. } => Some(data),
            Self::Register { .. } | Self::Notice { .. } => None,
        }
    }
}
