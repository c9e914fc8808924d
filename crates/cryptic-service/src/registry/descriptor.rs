//! Required-parameter descriptors and value kinds.

use std::fmt;

use serde_json::Value;

use cryptic_wire::Payload;

/// JSON value kinds a descriptor can require.
///
/// Kinds are exact: an `Integer` key rejects `1.5`, and a `Float` key rejects
/// `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// JSON string.
    String,
    /// JSON `true` or `false`.
    Boolean,
    /// JSON number without fraction or exponent.
    Integer,
    /// JSON number with a fraction or exponent.
    Float,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
    /// JSON `null`.
    Null,
}

impl ValueKind {
    /// Classifies a JSON value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(number) if number.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns `true` when `value` is exactly of this kind.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == self
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// First required key that a payload failed to satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMismatch {
    /// Required key name.
    pub key: String,
    /// Kind the descriptor demands.
    pub expected: ValueKind,
    /// Kind actually present, or `None` when the key was absent.
    pub found: Option<ValueKind>,
}

impl fmt::Display for ParameterMismatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                formatter,
                "parameter '{}' must be {}, found {found}",
                self.key, self.expected
            ),
            None => write!(
                formatter,
                "parameter '{}' ({}) is missing",
                self.key, self.expected
            ),
        }
    }
}

/// Ordered list of required keys paired with their kinds.
///
/// Keys not named by the descriptor are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointDescriptor {
    required: Vec<(String, ValueKind)>,
}

impl EndpointDescriptor {
    /// Pairs keys with kinds positionally.
    ///
    /// Returns `None` when the two lists differ in length.
    #[must_use]
    pub fn new(keys: &[&str], kinds: &[ValueKind]) -> Option<Self> {
        if keys.len() != kinds.len() {
            return None;
        }
        let required = keys
            .iter()
            .zip(kinds)
            .map(|(key, kind)| ((*key).to_owned(), *kind))
            .collect();
        Some(Self { required })
    }

    /// Required keys and kinds in declaration order.
    pub fn required(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.required.iter().map(|(key, kind)| (key.as_str(), *kind))
    }

    /// Checks every required key against `data` in order.
    ///
    /// # Errors
    ///
    /// Returns the first key that is absent or holds a value of another kind.
    pub fn validate(&self, data: &Payload) -> Result<(), ParameterMismatch> {
        for (key, expected) in &self.required {
            let found = data.get(key).map(ValueKind::of);
            if found != Some(*expected) {
                return Err(ParameterMismatch {
                    key: key.clone(),
                    expected: *expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    #[case::string(json!("abc"), ValueKind::String)]
    #[case::boolean(json!(false), ValueKind::Boolean)]
    #[case::integer(json!(5), ValueKind::Integer)]
    #[case::negative_integer(json!(-5), ValueKind::Integer)]
    #[case::float(json!(1.5), ValueKind::Float)]
    #[case::object(json!({}), ValueKind::Object)]
    #[case::array(json!([]), ValueKind::Array)]
    #[case::null(Value::Null, ValueKind::Null)]
    fn classifies_values(#[case] value: Value, #[case] expected: ValueKind) {
        assert_eq!(ValueKind::of(&value), expected);
    }

    #[test]
    fn rejects_mismatched_arity() {
        assert!(EndpointDescriptor::new(&["name", "owner"], &[ValueKind::String]).is_none());
    }

    #[rstest]
    #[case::wrong_kind(json!({"name": 5}), Some(ValueKind::Integer))]
    #[case::absent(json!({"other": "abc"}), None)]
    fn rejects_payloads_that_miss_a_requirement(
        #[case] data: Value,
        #[case] found: Option<ValueKind>,
    ) {
        let descriptor =
            EndpointDescriptor::new(&["name"], &[ValueKind::String]).expect("descriptor");
        let mismatch = descriptor
            .validate(&payload(data))
            .expect_err("payload should be rejected");
        assert_eq!(mismatch.key, "name");
        assert_eq!(mismatch.found, found);
    }

    #[test]
    fn accepts_exact_kinds_and_ignores_extra_keys() {
        let descriptor = EndpointDescriptor::new(
            &["name", "hidden"],
            &[ValueKind::String, ValueKind::Boolean],
        )
        .expect("descriptor");
        let data = payload(json!({"name": "abc", "hidden": true, "extra": 1}));
        assert!(descriptor.validate(&data).is_ok());
    }

    #[test]
    fn integer_keys_reject_fractional_numbers() {
        let descriptor =
            EndpointDescriptor::new(&["count"], &[ValueKind::Integer]).expect("descriptor");
        assert!(descriptor.validate(&payload(json!({"count": 1.5}))).is_err());
        assert!(descriptor.validate(&payload(json!({"count": 2}))).is_ok());
    }
}
