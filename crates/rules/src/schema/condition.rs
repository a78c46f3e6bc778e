//! A single field/operator/value condition.

use serde::{Deserialize, Deserializer, Serialize};

use super::{null_as_default, Operator};

/// One predicate of a rule: `field <operator> value`.
///
/// `field` is a dot path into the record (`cities.name`, `artists.0.id`).
/// `value` is a JSON literal or a relative-time token such as `"7_days_ago"`.
/// `compare_to` names a second field path for the percent operators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operator: Operator,
    /// `None` when the key is absent; an explicit JSON `null` is kept.
    #[serde(default, deserialize_with = "present_value", skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_to: Option<String>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: impl Into<Operator>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: None,
            compare_to: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_compare_to(mut self, field: impl Into<String>) -> Self {
        self.compare_to = Some(field.into());
        self
    }
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}
