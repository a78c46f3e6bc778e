//! Candidate event selection: lookback window and internal test-event
//! exclusion, applied before enrichment.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::evaluator::time::as_instant;

/// Range of numeric external ids reserved for internal/test events
/// (`AB4000`..`AB6999`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EidRange {
    pub prefix: String,
    pub start: u64,
    pub end: u64,
}

impl Default for EidRange {
    fn default() -> Self {
        Self {
            prefix: "AB".to_string(),
            start: 4000,
            end: 7000,
        }
    }
}

impl EidRange {
    /// True for ids shaped `<prefix><digits>` whose number falls in `[start, end)`.
    pub fn contains(&self, eid: &str) -> bool {
        let Some(digits) = eid.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        digits
            .parse::<u64>()
            .is_ok_and(|n| n >= self.start && n < self.end)
    }
}

/// Which fetched events are eligible for evaluation.
#[derive(Debug, Clone)]
pub struct EventSelection {
    pub lookback: Duration,
    pub excluded: EidRange,
}

impl EventSelection {
    pub fn new(lookback_days: i64) -> Self {
        Self {
            lookback: Duration::try_days(lookback_days).unwrap_or(Duration::MAX),
            excluded: EidRange::default(),
        }
    }

    /// Keep events with no start date or a parseable one inside the
    /// lookback window, minus internal test eids.
    pub fn keeps(&self, event: &Value, now: DateTime<Utc>) -> bool {
        let cutoff = now.checked_sub_signed(self.lookback);

        match event.get("event_start_datetime") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(start) => match (as_instant(start), cutoff) {
                (Some(at), Some(cutoff)) if at < cutoff => return false,
                (Some(_), _) => {}
                (None, _) => return false,
            },
        }

        match event.get("eid").and_then(Value::as_str) {
            Some(eid) => !self.excluded.contains(eid),
            None => true,
        }
    }

    pub fn apply(&self, events: Vec<Value>, now: DateTime<Utc>) -> Vec<Value> {
        let fetched = events.len();
        let kept: Vec<Value> = events.into_iter().filter(|e| self.keeps(e, now)).collect();
        tracing::debug!(fetched, kept = kept.len(), "Selected candidate events");
        kept
    }
}

impl Default for EventSelection {
    fn default() -> Self {
        Self::new(1460)
    }
}
