//! Per-run diagnostics: classification counts, record samples and
//! field presence statistics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coerce::is_blank;

/// Caps on how many records/values are kept in each sample list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLimits {
    pub matching: usize,
    pub near_match: usize,
    pub zero_match: usize,
    pub field_values: usize,
}

impl Default for SampleLimits {
    fn default() -> Self {
        Self {
            matching: 5,
            near_match: 5,
            zero_match: 3,
            field_values: 3,
        }
    }
}

/// Outcome of one rule evaluated over a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(rename = "totalEventsChecked")]
    pub total_checked: usize,
    #[serde(rename = "matchingEvents")]
    pub matching_count: usize,
    #[serde(rename = "matchingEventsList")]
    pub matching_sample: Vec<RecordSample>,
    #[serde(rename = "almostMatchingCount")]
    pub near_match_count: usize,
    #[serde(rename = "almostMatchingEvents")]
    pub near_match_sample: Vec<RecordSample>,
    #[serde(rename = "sampleFailures")]
    pub zero_match_sample: Vec<RecordSample>,
    /// Keyed by condition field, in first-seen condition order.
    #[serde(rename = "fieldPresence")]
    pub field_presence: IndexMap<String, FieldPresence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPresence {
    pub present: usize,
    pub missing: usize,
    pub sample: Vec<Value>,
}

impl FieldPresence {
    /// Count one record. Present means resolved, non-null and not `""`.
    pub fn observe(&mut self, value: Option<&Value>, sample_cap: usize) {
        if is_blank(value) {
            self.missing += 1;
            return;
        }
        self.present += 1;
        if let Some(v) = value {
            if self.sample.len() < sample_cap {
                self.sample.push(v.clone());
            }
        }
    }

    pub fn missing_ratio(&self) -> f64 {
        let total = self.present + self.missing;
        if total == 0 {
            0.0
        } else {
            self.missing as f64 / total as f64
        }
    }
}

/// Identity of a sampled record plus how each condition fared on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSample {
    #[serde(default)]
    pub eid: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub event_start_datetime: Option<Value>,
    #[serde(rename = "conditionResults")]
    pub condition_results: Vec<ConditionResult>,
    #[serde(rename = "metCount", default, skip_serializing_if = "Option::is_none")]
    pub met_count: Option<usize>,
    #[serde(rename = "totalConditions", default, skip_serializing_if = "Option::is_none")]
    pub total_conditions: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub field: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Absent when the field path did not resolve.
    #[serde(rename = "fieldValue", default, skip_serializing_if = "Option::is_none")]
    pub field_value: Option<Value>,
    pub met: bool,
}
