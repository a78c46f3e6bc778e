//! Condition operators as stored in the rule table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every operator the evaluator understands.
///
/// Rules are external configuration, so an operator name the evaluator does
/// not know is kept as [`Operator::Unsupported`] instead of failing the whole
/// rule. Unsupported operators always evaluate to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    IsNull,
    IsNotNull,
    GreaterThan,
    LessThan,
    Gte,
    Lte,
    Before,
    GreaterThanPercent,
    LessThanPercent,
    PastMinutes,
    PastHours,
    PastDays,
    WithinDays,
    UpcomingMinutes,
    UpcomingHours,
    UpcomingDays,
    UpcomingDaysMoreThan,
    IsEmpty,
    IsNotEmpty,
    Unsupported(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Before => "before",
            Operator::GreaterThanPercent => "greater_than_percent",
            Operator::LessThanPercent => "less_than_percent",
            Operator::PastMinutes => "past_minutes",
            Operator::PastHours => "past_hours",
            Operator::PastDays => "past_days",
            Operator::WithinDays => "within_days",
            Operator::UpcomingMinutes => "upcoming_minutes",
            Operator::UpcomingHours => "upcoming_hours",
            Operator::UpcomingDays => "upcoming_days",
            Operator::UpcomingDaysMoreThan => "upcoming_days_more_than",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::Unsupported(name) => name,
        }
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Unsupported(String::new())
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        match name.as_str() {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "is_null" => Operator::IsNull,
            "is_not_null" => Operator::IsNotNull,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "gte" => Operator::Gte,
            "lte" => Operator::Lte,
            "before" => Operator::Before,
            "greater_than_percent" => Operator::GreaterThanPercent,
            "less_than_percent" => Operator::LessThanPercent,
            "past_minutes" => Operator::PastMinutes,
            "past_hours" => Operator::PastHours,
            "past_days" => Operator::PastDays,
            "within_days" => Operator::WithinDays,
            "upcoming_minutes" => Operator::UpcomingMinutes,
            "upcoming_hours" => Operator::UpcomingHours,
            "upcoming_days" => Operator::UpcomingDays,
            "upcoming_days_more_than" => Operator::UpcomingDaysMoreThan,
            "is_empty" => Operator::IsEmpty,
            "is_not_empty" => Operator::IsNotEmpty,
            _ => Operator::Unsupported(name),
        }
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Operator::from(name.to_string())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unsupported(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
