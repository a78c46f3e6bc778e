//! Timestamp parsing, relative-time tokens and elapsed-time units.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Granularity of the `past_*` / `upcoming_*` operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn seconds(self) -> f64 {
        match self {
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
        }
    }

    fn parse(unit: &str) -> Option<Self> {
        match unit {
            "minute" | "minutes" => Some(TimeUnit::Minutes),
            "hour" | "hours" => Some(TimeUnit::Hours),
            "day" | "days" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    /// Fractional number of units from `from` to `to` (negative when `to` is earlier).
    pub fn between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        (to - from).num_milliseconds() as f64 / 1_000.0 / self.seconds()
    }
}

/// Parse a relative-time token such as `7_days_ago` or `1_hour_ago`.
pub fn parse_relative(token: &str) -> Option<Duration> {
    let body = token.strip_suffix("_ago")?;
    let (amount, unit) = body.split_once('_')?;
    let amount: i64 = amount.parse().ok()?;
    if amount < 0 {
        return None;
    }
    match TimeUnit::parse(unit)? {
        TimeUnit::Minutes => Duration::try_minutes(amount),
        TimeUnit::Hours => Duration::try_hours(amount),
        TimeUnit::Days => Duration::try_days(amount),
    }
}

/// Resolve a relative-time token against `now`.
pub fn resolve_relative(value: &Value, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let offset = parse_relative(value.as_str()?)?;
    now.checked_sub_signed(offset)
}

/// Timestamp view of a field value.
///
/// Accepts RFC 3339, Postgres-style `YYYY-MM-DD HH:MM:SS+TZ`, naive
/// datetimes (read as UTC), bare dates (UTC midnight) and epoch milliseconds.
pub fn as_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let millis = n.as_f64().filter(|v| v.is_finite())?;
            Utc.timestamp_millis_opt(millis as i64).single()
        }
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
