//! Lint findings: every active rule run against every selected event.
//!
//! A finding is produced for each (rule, event) pair where all of the
//! rule's conditions hold. Percent conditions can compare against
//! same-city baselines, and the rule's message template is rendered with
//! the event, a relative-time context and those baselines.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enrichment::number_value;
use crate::evaluator::time::as_instant;
use crate::evaluator::{as_number, resolve_path, FieldLookup, RuleEvaluator};
use crate::schema::{LinterRule, Severity};

/// One rule firing on one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub category: Option<String>,
    pub context: Option<String>,
    pub emoji: Option<String>,
    pub message: String,
    pub event_id: Option<Value>,
    pub event_eid: Option<Value>,
    pub event_name: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Narrow a lint run to one event and/or one severity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LintFilter {
    #[serde(default)]
    pub eid: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintReport {
    pub success: bool,
    pub rules_evaluated: usize,
    pub events_checked: usize,
    /// Findings per severity; the five known severities are always present.
    pub summary: IndexMap<String, usize>,
    pub findings: Vec<Finding>,
}

impl LintReport {
    pub fn new(rules_evaluated: usize, events_checked: usize, findings: Vec<Finding>) -> Self {
        let mut summary: IndexMap<String, usize> = ["error", "warning", "reminder", "info", "success"]
            .into_iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        for f in &findings {
            *summary.entry(f.severity.as_str().to_string()).or_default() += 1;
        }
        Self {
            success: true,
            rules_evaluated,
            events_checked,
            summary,
            findings,
        }
    }
}

/// Evaluate every rule against every event, with findings ordered by
/// severity (error first).
///
/// Rules outside the severity filter and rules without conditions are not
/// evaluated and do not count towards `rules_evaluated`.
pub fn lint_events(
    evaluator: &RuleEvaluator,
    rules: &[LinterRule],
    events: &[Value],
    severity: Option<&Severity>,
) -> LintReport {
    let now = evaluator.now();
    let compiled: Vec<_> = rules
        .iter()
        .filter(|r| severity.map_or(true, |s| &r.severity == s))
        .map(|r| (r, evaluator.compile(r)))
        .filter(|(_, c)| !c.is_empty())
        .collect();
    let cities = CityIndex::build(events, now);

    let mut findings = Vec::new();
    for event in events {
        let comparative = cities.comparative(event);
        for (rule, compiled) in &compiled {
            if compiled.matches(event, Some(&comparative)) {
                findings.push(finding(rule, event, &comparative, now));
            }
        }
    }

    findings.sort_by_key(|f| f.severity.rank());
    LintReport::new(compiled.len(), events.len(), findings)
}

fn finding(
    rule: &LinterRule,
    event: &Value,
    comparative: &Map<String, Value>,
    now: DateTime<Utc>,
) -> Finding {
    let message = rule
        .message
        .as_deref()
        .map(|t| interpolate_message(t, event, comparative, now))
        .unwrap_or_default();

    Finding {
        rule_id: rule.rule_id.clone(),
        rule_name: rule.name.clone(),
        severity: rule.severity.clone(),
        category: rule.category.clone(),
        context: rule.context.clone(),
        emoji: rule.severity.emoji().map(String::from),
        message,
        event_id: event.lookup("id").cloned(),
        event_eid: event.lookup("eid").cloned(),
        event_name: event.lookup("name").cloned(),
        timestamp: now,
    }
}

// ── Same-city baselines ─────────────────────────────────────────────

/// Past events grouped by `cities.id`.
struct CityIndex<'a> {
    by_city: HashMap<String, Vec<&'a Value>>,
}

impl<'a> CityIndex<'a> {
    fn build(events: &'a [Value], now: DateTime<Utc>) -> Self {
        let mut by_city: HashMap<String, Vec<&'a Value>> = HashMap::new();
        for event in events {
            let Some(city) = city_key(event) else {
                continue;
            };
            let ended = event
                .lookup("event_end_datetime")
                .and_then(as_instant)
                .is_some_and(|end| end < now);
            if ended {
                by_city.entry(city).or_default().push(event);
            }
        }
        Self { by_city }
    }

    /// `city_average` (ticket sales), `city_average_food_beverage` and
    /// `city_typical` (applied artists, rounded) over other past events in
    /// the same city. Empty when there are none.
    fn comparative(&self, event: &Value) -> Map<String, Value> {
        let mut out = Map::new();
        let Some(peers) = city_key(event).and_then(|c| self.by_city.get(&c)) else {
            return out;
        };
        let id = event.lookup("id");
        let peers: Vec<&Value> = peers
            .iter()
            .copied()
            .filter(|p| p.lookup("id") != id)
            .collect();
        if peers.is_empty() {
            return out;
        }

        let avg = |field: &str| {
            let total: f64 = peers
                .iter()
                .map(|p| p.lookup(field).and_then(as_number).unwrap_or(0.0))
                .sum();
            total / peers.len() as f64
        };
        out.insert("city_average".into(), number_value(avg("ticket_sales")));
        out.insert(
            "city_average_food_beverage".into(),
            number_value(avg("food_beverage_revenue")),
        );
        out.insert(
            "city_typical".into(),
            number_value(avg("applied_artists_count").round()),
        );
        out
    }
}

fn city_key(event: &Value) -> Option<String> {
    match event.lookup("cities.id")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ── Message rendering ───────────────────────────────────────────────

/// Elapsed/remaining time relative to the event's start and end.
///
/// Past starts give `minutes_ago`, `hours_ago`, `days_ago`; future starts
/// give `minutes_until`, `hours_until`, `days_until`. A past end overrides
/// `days_ago`.
pub fn time_context(event: &Value, now: DateTime<Utc>) -> Map<String, Value> {
    let mut ctx = Map::new();

    if let Some(start) = event.lookup("event_start_datetime").and_then(as_instant) {
        let diff_ms = (now - start).num_milliseconds();
        let minutes = diff_ms.div_euclid(60_000);
        let hours = diff_ms.div_euclid(3_600_000);
        let days = diff_ms.div_euclid(86_400_000);
        if diff_ms > 0 {
            ctx.insert("minutes_ago".into(), minutes.into());
            ctx.insert("hours_ago".into(), hours.into());
            ctx.insert("days_ago".into(), days.into());
        } else {
            ctx.insert("minutes_until".into(), minutes.abs().into());
            ctx.insert("hours_until".into(), hours.abs().into());
            ctx.insert("days_until".into(), days.abs().into());
        }
    }

    if let Some(end) = event.lookup("event_end_datetime").and_then(as_instant) {
        let diff_ms = (now - end).num_milliseconds();
        if diff_ms > 0 {
            ctx.insert("days_ago".into(), diff_ms.div_euclid(86_400_000).into());
        }
    }

    ctx
}

/// `percent_of_previous` from the `prev_*` comparison fields, if any.
fn percent_of_previous(event: &Value) -> Option<i64> {
    let mut out = None;
    for (current, previous) in [
        ("ticket_revenue", "prev_ticket_revenue"),
        ("total_votes", "prev_total_votes"),
        ("auction_revenue", "prev_auction_revenue"),
    ] {
        let Some(prev) = event.lookup(previous).and_then(as_number).filter(|p| *p > 0.0) else {
            continue;
        };
        let cur = event.lookup(current).and_then(as_number).unwrap_or(0.0);
        out = Some((cur / prev * 100.0).round() as i64);
    }
    out
}

/// Replace `{{ path }}` placeholders from the event merged with the time
/// context, comparative baselines and `percent_of_previous`. Placeholders
/// that do not resolve, or resolve to null, are left as written.
pub fn interpolate_message(
    template: &str,
    event: &Value,
    comparative: &Map<String, Value>,
    now: DateTime<Utc>,
) -> String {
    let mut ctx = event.as_object().cloned().unwrap_or_default();
    ctx.extend(time_context(event, now));
    ctx.extend(comparative.clone());
    if let Some(pct) = percent_of_previous(event) {
        ctx.insert("percent_of_previous".into(), pct.into());
    }
    let ctx = Value::Object(ctx);

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            break;
        };
        let key = &after[..close];
        out.push_str(&rest[..open]);
        let placeholder = &rest[open..open + 2 + close + 2];

        match resolve_path(&ctx, key.trim()) {
            Some(v) if !key.contains('}') && !v.is_null() => out.push_str(&display(v)),
            _ => out.push_str(placeholder),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
