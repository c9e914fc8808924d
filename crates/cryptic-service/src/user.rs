//! End-user records returned by the hub.

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use cryptic_wire::Payload;

/// Account details of an end user, as reported by the hub.
///
/// Two records are equal when they describe the same user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    uuid: Uuid,
    name: String,
    created: OffsetDateTime,
    last: OffsetDateTime,
}

impl UserRecord {
    /// Builds a record from its fields.
    #[must_use]
    pub const fn new(uuid: Uuid, name: String, created: OffsetDateTime, last: OffsetDateTime) -> Self {
        Self {
            uuid,
            name,
            created,
            last,
        }
    }

    /// Reads the hub's answer to a user lookup.
    ///
    /// Returns `None` unless `valid` is `true` and every field is present
    /// with the expected shape. Timestamps are epoch milliseconds.
    #[must_use]
    pub fn from_lookup(data: &Payload) -> Option<Self> {
        if data.get("valid").and_then(Value::as_bool) != Some(true) {
            return None;
        }
        let uuid = data
            .get("uuid")
            .and_then(Value::as_str)
            .and_then(|text| Uuid::parse_str(text).ok())?;
        let name = data.get("name").and_then(Value::as_str)?.to_owned();
        let created = timestamp(data.get("created"))?;
        let last = timestamp(data.get("last"))?;
        Some(Self::new(uuid, name, created, last))
    }

    /// Account identifier.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Account creation time.
    #[must_use]
    pub const fn created(&self) -> OffsetDateTime {
        self.created
    }

    /// Most recent login.
    #[must_use]
    pub const fn last(&self) -> OffsetDateTime {
        self.last
    }
}

impl PartialEq for UserRecord {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for UserRecord {}

fn timestamp(value: Option<&Value>) -> Option<OffsetDateTime> {
    let millis = value.and_then(Value::as_i64)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}
