//! Conditions compiled into typed predicates.
//!
//! Compilation parses each condition's payload once per run (threshold
//! numbers, time amounts, literal or relative time bounds). A payload that
//! does not parse compiles to [`Predicate::Never`], so a malformed rule row
//! evaluates to `false` instead of failing the run.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::schema::{Condition, Operator};

use super::coerce::{as_number, is_blank, is_nullish, strict_eq};
use super::path::FieldLookup;
use super::time::{as_instant, resolve_relative, TimeUnit};

/// Right-hand side of an equality check.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expected {
    Json(Value),
    /// A relative-time token resolved against the run's clock.
    Instant(DateTime<Utc>),
}

impl Expected {
    fn compile(value: &Value, now: DateTime<Utc>) -> Self {
        match resolve_relative(value, now) {
            Some(instant) => Expected::Instant(instant),
            None => Expected::Json(value.clone()),
        }
    }

    fn matches(&self, field: &Value) -> bool {
        match self {
            Expected::Json(expected) => strict_eq(field, expected),
            Expected::Instant(expected) => as_instant(field) == Some(*expected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumCmp {
    Gt,
    Lt,
    Gte,
    Lte,
}

impl NumCmp {
    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            NumCmp::Gt => lhs > rhs,
            NumCmp::Lt => lhs < rhs,
            NumCmp::Gte => lhs >= rhs,
            NumCmp::Lte => lhs <= rhs,
        }
    }
}

/// Numeric threshold, or a time bound when the value was a relative token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Bound {
    Number(f64),
    Instant(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    Equals(Option<Expected>),
    NotEquals(Option<Expected>),
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    Numeric { cmp: NumCmp, bound: Bound },
    Before(DateTime<Utc>),
    Percent { above: bool, threshold: f64, compare_to: String },
    Past { unit: TimeUnit, amount: f64 },
    WithinDays(f64),
    Upcoming { unit: TimeUnit, amount: f64 },
    UpcomingDaysMoreThan(f64),
    /// Unknown operator or unparsable payload.
    Never,
}

impl Predicate {
    pub(crate) fn compile(condition: &Condition, now: DateTime<Utc>) -> Self {
        let value = condition.value.as_ref();
        let amount = || value.and_then(as_number);

        let compiled = match &condition.operator {
            Operator::Equals => Some(Predicate::Equals(value.map(|v| Expected::compile(v, now)))),
            Operator::NotEquals => {
                Some(Predicate::NotEquals(value.map(|v| Expected::compile(v, now))))
            }
            Operator::IsNull => Some(Predicate::IsNull),
            Operator::IsNotNull => Some(Predicate::IsNotNull),
            Operator::IsEmpty => Some(Predicate::IsEmpty),
            Operator::IsNotEmpty => Some(Predicate::IsNotEmpty),
            Operator::GreaterThan => numeric(NumCmp::Gt, value, now),
            Operator::LessThan => numeric(NumCmp::Lt, value, now),
            Operator::Gte => numeric(NumCmp::Gte, value, now),
            Operator::Lte => numeric(NumCmp::Lte, value, now),
            Operator::Before => value
                .and_then(|v| resolve_relative(v, now).or_else(|| as_instant(v)))
                .map(Predicate::Before),
            Operator::GreaterThanPercent | Operator::LessThanPercent => {
                match (amount(), condition.compare_to.as_deref()) {
                    (Some(threshold), Some(compare_to)) if !compare_to.is_empty() => {
                        Some(Predicate::Percent {
                            above: condition.operator == Operator::GreaterThanPercent,
                            threshold,
                            compare_to: compare_to.to_string(),
                        })
                    }
                    _ => None,
                }
            }
            Operator::PastMinutes => amount().map(|a| past(TimeUnit::Minutes, a)),
            Operator::PastHours => amount().map(|a| past(TimeUnit::Hours, a)),
            Operator::PastDays => amount().map(|a| past(TimeUnit::Days, a)),
            Operator::WithinDays => amount().map(Predicate::WithinDays),
            Operator::UpcomingMinutes => amount().map(|a| upcoming(TimeUnit::Minutes, a)),
            Operator::UpcomingHours => amount().map(|a| upcoming(TimeUnit::Hours, a)),
            Operator::UpcomingDays => amount().map(|a| upcoming(TimeUnit::Days, a)),
            Operator::UpcomingDaysMoreThan => amount().map(Predicate::UpcomingDaysMoreThan),
            Operator::Unsupported(_) => None,
        };

        compiled.unwrap_or(Predicate::Never)
    }

    /// Evaluate against an already-resolved field value.
    ///
    /// `record` is only consulted by the percent operators for their
    /// `compare_to` path; `comparative` holds precomputed baselines (city
    /// averages) that take precedence over the record's own field.
    pub(crate) fn test<R: FieldLookup + ?Sized>(
        &self,
        field: Option<&Value>,
        record: &R,
        comparative: Option<&Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> bool {
        match self {
            Predicate::IsNull => is_nullish(field),
            Predicate::IsNotNull => !is_nullish(field),
            Predicate::IsEmpty => is_blank(field),
            Predicate::IsNotEmpty => !is_blank(field),
            Predicate::Equals(expected) => match (field, expected) {
                (Some(actual), Some(expected)) => expected.matches(actual),
                _ => false,
            },
            Predicate::NotEquals(expected) => match (field, expected) {
                (Some(actual), Some(expected)) => !expected.matches(actual),
                (Some(_), None) => true,
                (None, _) => false,
            },
            Predicate::Numeric { cmp, bound } => match bound {
                Bound::Number(threshold) => field
                    .and_then(as_number)
                    .is_some_and(|v| cmp.holds(v, *threshold)),
                Bound::Instant(at) => field.and_then(as_instant).is_some_and(|t| {
                    cmp.holds(t.timestamp_millis() as f64, at.timestamp_millis() as f64)
                }),
            },
            Predicate::Before(bound) => field.and_then(as_instant).is_some_and(|t| t < *bound),
            Predicate::Percent {
                above,
                threshold,
                compare_to,
            } => {
                let Some(current) = field.and_then(as_number) else {
                    return false;
                };
                let baseline = comparative
                    .and_then(|c| c.get(compare_to))
                    .and_then(as_number)
                    .filter(|v| *v != 0.0)
                    .or_else(|| record.lookup(compare_to).and_then(as_number));
                match baseline {
                    Some(base) if base != 0.0 => {
                        let pct = current / base * 100.0;
                        if *above {
                            pct > *threshold
                        } else {
                            pct < *threshold
                        }
                    }
                    _ => false,
                }
            }
            Predicate::Past { unit, amount } => field
                .and_then(as_instant)
                .is_some_and(|t| unit.between(t, now) >= *amount),
            Predicate::WithinDays(days) => field.and_then(as_instant).is_some_and(|t| {
                let elapsed = TimeUnit::Days.between(t, now);
                (0.0..=*days).contains(&elapsed)
            }),
            Predicate::Upcoming { unit, amount } => field.and_then(as_instant).is_some_and(|t| {
                let ahead = unit.between(now, t);
                ahead > 0.0 && ahead <= *amount
            }),
            Predicate::UpcomingDaysMoreThan(days) => field
                .and_then(as_instant)
                .is_some_and(|t| TimeUnit::Days.between(now, t) > *days),
            Predicate::Never => false,
        }
    }
}

fn numeric(cmp: NumCmp, value: Option<&Value>, now: DateTime<Utc>) -> Option<Predicate> {
    let value = value?;
    let bound = match resolve_relative(value, now) {
        Some(at) => Bound::Instant(at),
        None => Bound::Number(as_number(value)?),
    };
    Some(Predicate::Numeric { cmp, bound })
}

fn past(unit: TimeUnit, amount: f64) -> Predicate {
    Predicate::Past { unit, amount }
}

fn upcoming(unit: TimeUnit, amount: f64) -> Predicate {
    Predicate::Upcoming { unit, amount }
}
