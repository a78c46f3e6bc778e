//! Rule evaluation over batches of schema-less event records.
//!
//! A run compiles every condition of a rule once against a single clock
//! instant, then evaluates each record against all conditions without
//! short-circuiting so the diagnostics can show every condition result.
//! Records are classified as:
//! - **matching**: every condition met
//! - **near-match**: exactly one condition missed
//! - **zero-match**: no condition met (sampled for diagnostics only)

mod coerce;
mod diagnostics;
mod path;
mod predicate;
mod recommend;
pub mod time;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::{Condition, LinterRule};

pub use coerce::as_number;
pub use diagnostics::{ConditionResult, Diagnostics, FieldPresence, RecordSample, SampleLimits};
pub use path::{resolve_path, FieldLookup};
pub use recommend::{reason, recommendations};

use predicate::Predicate;

// ── Compiled rule ───────────────────────────────────────────────────

/// A rule's conditions compiled against one evaluation instant.
pub struct CompiledRule<'r> {
    conditions: Vec<(&'r Condition, Predicate)>,
    now: DateTime<Utc>,
}

impl<'r> CompiledRule<'r> {
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// True when every condition holds. Rules without conditions never match.
    pub fn matches<R: FieldLookup + ?Sized>(
        &self,
        record: &R,
        comparative: Option<&Map<String, Value>>,
    ) -> bool {
        !self.conditions.is_empty()
            && self.conditions.iter().all(|(cond, predicate)| {
                predicate.test(record.lookup(&cond.field), record, comparative, self.now)
            })
    }

    fn results<R: FieldLookup + ?Sized>(&self, record: &R) -> Vec<ConditionResult> {
        self.conditions
            .iter()
            .map(|(cond, predicate)| {
                let field_value = record.lookup(&cond.field);
                ConditionResult {
                    field: cond.field.clone(),
                    operator: cond.operator.to_string(),
                    value: cond.value.clone(),
                    field_value: field_value.cloned(),
                    met: predicate.test(field_value, record, None, self.now),
                }
            })
            .collect()
    }
}

// ── Rule evaluator ──────────────────────────────────────────────────

/// Evaluates linter rules against event records at a fixed instant.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    now: DateTime<Utc>,
    limits: SampleLimits,
}

impl RuleEvaluator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            limits: SampleLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SampleLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn compile<'r>(&self, rule: &'r LinterRule) -> CompiledRule<'r> {
        CompiledRule {
            conditions: rule
                .conditions
                .iter()
                .map(|c| (c, Predicate::compile(c, self.now)))
                .collect(),
            now: self.now,
        }
    }

    /// Evaluate `rule` against every record and collect diagnostics.
    ///
    /// A rule with no conditions is reported without touching any record.
    pub fn evaluate<R: FieldLookup>(&self, rule: &LinterRule, records: &[R]) -> Diagnostics {
        let mut diag = Diagnostics {
            total_checked: records.len(),
            ..Default::default()
        };

        let compiled = self.compile(rule);
        if compiled.is_empty() {
            debug!(rule_id = %rule.rule_id, "Rule has no conditions, skipping evaluation");
            return diag;
        }

        for cond in &rule.conditions {
            diag.field_presence.entry(cond.field.clone()).or_default();
        }

        let total = compiled.len();
        for record in records {
            for (field, presence) in diag.field_presence.iter_mut() {
                presence.observe(record.lookup(field), self.limits.field_values);
            }

            let results = compiled.results(record);
            let met = results.iter().filter(|r| r.met).count();

            if met == total {
                diag.matching_count += 1;
                if diag.matching_sample.len() < self.limits.matching {
                    diag.matching_sample.push(sample(record, results));
                }
            } else {
                if met + 1 == total {
                    diag.near_match_count += 1;
                    if diag.near_match_sample.len() < self.limits.near_match {
                        let mut s = sample(record, results.clone());
                        s.met_count = Some(met);
                        s.total_conditions = Some(total);
                        diag.near_match_sample.push(s);
                    }
                }
                if met == 0 && diag.zero_match_sample.len() < self.limits.zero_match {
                    diag.zero_match_sample.push(sample(record, results));
                }
            }
        }

        debug!(
            rule_id = %rule.rule_id,
            checked = diag.total_checked,
            matching = diag.matching_count,
            near = diag.near_match_count,
            "Rule evaluated"
        );
        diag
    }
}

fn sample<R: FieldLookup + ?Sized>(record: &R, results: Vec<ConditionResult>) -> RecordSample {
    RecordSample {
        eid: record.lookup("eid").cloned(),
        name: record.lookup("name").cloned(),
        event_start_datetime: record.lookup("event_start_datetime").cloned(),
        condition_results: results,
        met_count: None,
        total_conditions: None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────
