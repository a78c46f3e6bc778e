//! Metric rows returned by the batch metrics function.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::evaluator::as_number;

/// Derived metrics for one event, keyed by external id.
///
/// Missing, null or non-numeric columns read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetrics {
    pub eid: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub confirmed_artists_count: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub applied_artists_count: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ticket_revenue: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub auction_revenue: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_votes: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ticket_sales: f64,
}

impl EventMetrics {
    /// Record fields this row contributes, including the
    /// `event_artists_confirmed_count` alias.
    pub fn fields(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in [
            ("confirmed_artists_count", self.confirmed_artists_count),
            ("event_artists_confirmed_count", self.confirmed_artists_count),
            ("applied_artists_count", self.applied_artists_count),
            ("ticket_revenue", self.ticket_revenue),
            ("auction_revenue", self.auction_revenue),
            ("total_votes", self.total_votes),
            ("ticket_sales", self.ticket_sales),
        ] {
            out.insert(key.to_string(), number_value(value));
        }
        out
    }
}

/// Whole numbers stay integers on the wire.
pub(crate) fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::from(0))
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(as_number(&raw).unwrap_or(0.0))
}
