//! Rule-test and lint runs against injected stores.
//!
//! A rule test loads one active rule, fetches a batch of events, selects
//! candidates, enriches them with one batch metrics lookup and evaluates the rule.
//! Each store call goes through the retry policy and the whole run is
//! bounded by a wall-clock budget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use linter_core::EvaluatorConfig;

use crate::clock::{Clock, SystemClock};
use crate::enrichment::enrich;
use crate::error::RuleTestError;
use crate::evaluator::{reason, recommendations, Diagnostics, RuleEvaluator, SampleLimits};
use crate::findings::{lint_events, LintFilter, LintReport};
use crate::retry::RetryPolicy;
use crate::schema::{Condition, Severity};
use crate::selection::EventSelection;
use crate::store::{MetricsStore, RecordStore, RuleStore};

/// Result of testing one rule, as returned to the rule editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTestReport {
    pub success: bool,
    pub rule_id: String,
    pub rule_name: String,
    pub rule_description: Option<String>,
    pub severity: Severity,
    pub category: Option<String>,
    pub context: Option<String>,
    pub conditions: Vec<Condition>,
    pub matching_count: usize,
    pub diagnostics: Diagnostics,
    pub recommendations: Vec<String>,
    pub reason: String,
}

/// Drives rule tests and lint runs over a rule store, a record store and a
/// metrics store.
#[derive(Clone)]
pub struct RuleTester {
    rules: Arc<dyn RuleStore>,
    records: Arc<dyn RecordStore>,
    metrics: Arc<dyn MetricsStore>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    selection: EventSelection,
    limits: SampleLimits,
    event_limit: usize,
    budget: Duration,
}

impl RuleTester {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        records: Arc<dyn RecordStore>,
        metrics: Arc<dyn MetricsStore>,
    ) -> Self {
        Self::from_config(rules, records, metrics, &EvaluatorConfig::default())
    }

    pub fn from_config(
        rules: Arc<dyn RuleStore>,
        records: Arc<dyn RecordStore>,
        metrics: Arc<dyn MetricsStore>,
        config: &EvaluatorConfig,
    ) -> Self {
        Self {
            rules,
            records,
            metrics,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_base_ms),
            selection: EventSelection::new(config.lookback_days as i64),
            limits: SampleLimits::default(),
            event_limit: config.event_limit as usize,
            budget: Duration::from_secs(config.run_budget_secs),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_limits(mut self, limits: SampleLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Test one rule by id against the current event batch.
    pub async fn test_rule(&self, rule_id: &str) -> Result<RuleTestReport, RuleTestError> {
        let rule_id = rule_id.trim();
        if rule_id.is_empty() {
            return Err(RuleTestError::MissingRuleId);
        }

        let started = Instant::now();
        let report = tokio::time::timeout(self.budget, self.run_rule_test(rule_id))
            .await
            .map_err(|_| {
                warn!(rule_id, budget_secs = self.budget.as_secs(), "Rule test exceeded budget");
                RuleTestError::Timeout(self.budget.as_secs())
            })??;

        info!(
            rule_id,
            matching = report.matching_count,
            checked = report.diagnostics.total_checked,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rule test complete"
        );
        Ok(report)
    }

    async fn run_rule_test(&self, rule_id: &str) -> Result<RuleTestReport, RuleTestError> {
        let rule = self
            .retry
            .run("active_rule", || self.rules.active_rule(rule_id))
            .await
            .map_err(RuleTestError::Database)?
            .ok_or_else(|| RuleTestError::RuleNotFound(rule_id.to_string()))?;

        let now = self.clock.now();
        let mut events = self.candidate_events(None, now).await?;
        enrich(self.metrics.as_ref(), &self.retry, &mut events).await;

        let evaluator = RuleEvaluator::new(now).with_limits(self.limits);
        let diagnostics = evaluator.evaluate(&rule, &events);
        let recommendations = recommendations(rule.conditions.len(), &diagnostics);

        Ok(RuleTestReport {
            success: true,
            matching_count: diagnostics.matching_count,
            reason: reason(diagnostics.matching_count),
            recommendations,
            diagnostics,
            rule_id: rule.rule_id,
            rule_name: rule.name,
            rule_description: rule.description,
            severity: rule.severity,
            category: rule.category,
            context: rule.context,
            conditions: rule.conditions,
        })
    }

    /// Run every active rule against the selected events.
    pub async fn lint(&self, filter: &LintFilter) -> Result<LintReport, RuleTestError> {
        tokio::time::timeout(self.budget, self.run_lint(filter))
            .await
            .map_err(|_| RuleTestError::Timeout(self.budget.as_secs()))?
    }

    async fn run_lint(&self, filter: &LintFilter) -> Result<LintReport, RuleTestError> {
        let rules = self
            .retry
            .run("active_rules", || self.rules.active_rules())
            .await
            .map_err(RuleTestError::Database)?;

        let now = self.clock.now();
        let mut events = self.candidate_events(filter.eid.as_deref(), now).await?;
        enrich(self.metrics.as_ref(), &self.retry, &mut events).await;

        let evaluator = RuleEvaluator::new(now);
        let report = lint_events(&evaluator, &rules, &events, filter.severity.as_ref());
        info!(
            active_rules = rules.len(),
            evaluated = report.rules_evaluated,
            events = report.events_checked,
            findings = report.findings.len(),
            "Lint run complete"
        );
        Ok(report)
    }

    /// Fetch and select events. With an `eid` filter only that event is
    /// kept and the lookback window does not apply.
    async fn candidate_events(
        &self,
        eid: Option<&str>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Value>, RuleTestError> {
        let limit = self.event_limit;
        let events = self
            .retry
            .run("recent_events", || self.records.recent_events(limit))
            .await
            .map_err(RuleTestError::FetchEvents)?;

        Ok(match eid {
            Some(eid) if !self.selection.excluded.contains(eid) => events
                .into_iter()
                .filter(|e| e.get("eid").and_then(Value::as_str) == Some(eid))
                .collect(),
            Some(_) => Vec::new(),
            None => self.selection.apply(events, now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::enrichment::EventMetrics;
    use crate::schema::{LinterRule, RuleStatus};
    use crate::store::{MemoryStore, StoreError};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn votes_rule() -> LinterRule {
        LinterRule {
            rule_id: "low-votes".into(),
            name: "Low votes".into(),
            description: Some("Votes below ten".into()),
            severity: Severity::Warning,
            category: Some("voting".into()),
            context: None,
            status: RuleStatus::Active,
            conditions: vec![Condition::new("total_votes", "less_than").with_value(10)],
            message: Some("Only {{total_votes}} votes".into()),
        }
    }

    fn tester(store: MemoryStore) -> (Arc<MemoryStore>, RuleTester) {
        let store = Arc::new(store);
        let tester = RuleTester::new(store.clone(), store.clone(), store.clone())
            .with_clock(Arc::new(FixedClock(now())))
            .with_retry(RetryPolicy::new(2, 1));
        (store, tester)
    }

    #[tokio::test]
    async fn blank_rule_id_is_rejected() {
        let (_, t) = tester(MemoryStore::new());
        assert!(matches!(t.test_rule("  ").await, Err(RuleTestError::MissingRuleId)));
    }

    #[tokio::test]
    async fn unknown_rule_is_not_found() {
        let (_, t) = tester(MemoryStore::new().with_rules(vec![votes_rule()]));
        let err = t.test_rule("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Rule nope not found or not active");
    }

    #[tokio::test]
    async fn report_uses_enriched_metrics() {
        let store = MemoryStore::new()
            .with_rules(vec![votes_rule()])
            .with_events(vec![json!({"eid": "AB1"}), json!({"eid": "AB2"}), json!({"eid": "AB5001"})])
            .with_metrics(vec![
                EventMetrics { eid: "AB1".into(), total_votes: 3.0, ..Default::default() },
                EventMetrics { eid: "AB2".into(), total_votes: 30.0, ..Default::default() },
                EventMetrics { eid: "AB5001".into(), total_votes: 1.0, ..Default::default() },
            ]);
        let (store, t) = tester(store);

        let report = t.test_rule("low-votes").await.unwrap();

        assert!(report.success);
        assert_eq!(report.rule_name, "Low votes");
        assert_eq!(report.diagnostics.total_checked, 2);
        assert_eq!(report.matching_count, 1);
        assert_eq!(report.reason, "1 events match");
        assert!(report.recommendations.is_empty());
        assert_eq!(store.metrics_calls(), 1);
    }

    #[tokio::test]
    async fn metrics_outage_degrades_to_unenriched_run() {
        let store = MemoryStore::new()
            .with_rules(vec![votes_rule()])
            .with_events(vec![json!({"eid": "AB1"})])
            .with_metrics_down();
        let (_, t) = tester(store);

        let report = t.test_rule("low-votes").await.unwrap();

        assert_eq!(report.matching_count, 0);
        assert_eq!(report.reason, "No events match all conditions");
        assert_eq!(
            report.recommendations,
            vec![
                "Field \"total_votes\" is missing in 100% of events - may not be populated in database",
                "Found 1 events that almost match (off by 1 condition) - conditions may be too strict",
            ]
        );
    }

    #[tokio::test]
    async fn transient_metrics_failure_is_retried() {
        let store = MemoryStore::new()
            .with_rules(vec![votes_rule()])
            .with_events(vec![json!({"eid": "AB1"})])
            .with_metrics(vec![EventMetrics {
                eid: "AB1".into(),
                total_votes: 3.0,
                ..Default::default()
            }])
            .with_metrics_failures(1);
        let (store, t) = tester(store);

        let report = t.test_rule("low-votes").await.unwrap();

        assert_eq!(report.matching_count, 1);
        assert_eq!(store.metrics_calls(), 2);
    }

    #[tokio::test]
    async fn event_fetch_is_retried_then_fails() {
        let store = MemoryStore::new()
            .with_rules(vec![votes_rule()])
            .with_events(vec![json!({"eid": "AB1", "total_votes": 2})]);

        let (_, t) = tester(store.with_event_failures(1));
        assert_eq!(t.test_rule("low-votes").await.unwrap().matching_count, 1);

        let store = MemoryStore::new()
            .with_rules(vec![votes_rule()])
            .with_event_failures(5);
        let (_, t) = tester(store);
        let err = t.test_rule("low-votes").await.unwrap_err();
        assert!(matches!(err, RuleTestError::FetchEvents(StoreError::Transport(_))));
    }

    struct SlowRules;

    #[async_trait::async_trait]
    impl RuleStore for SlowRules {
        async fn active_rule(&self, _: &str) -> Result<Option<LinterRule>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn active_rules(&self) -> Result<Vec<LinterRule>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn run_budget_times_out() {
        let store = Arc::new(MemoryStore::new());
        let t = RuleTester::new(Arc::new(SlowRules), store.clone(), store)
            .with_budget(Duration::from_millis(20));
        assert!(matches!(t.test_rule("any").await, Err(RuleTestError::Timeout(_))));
    }

    #[tokio::test]
    async fn lint_filters_by_eid() {
        let store = MemoryStore::new()
            .with_rules(vec![votes_rule()])
            .with_events(vec![
                json!({"eid": "AB1", "total_votes": 2}),
                json!({"eid": "AB2", "total_votes": 4}),
            ]);
        let (_, t) = tester(store);

        let all = t.lint(&LintFilter::default()).await.unwrap();
        assert_eq!(all.findings.len(), 2);
        assert_eq!(all.summary["warning"], 2);

        let one = t
            .lint(&LintFilter { eid: Some("AB2".into()), severity: None })
            .await
            .unwrap();
        assert_eq!(one.events_checked, 1);
        assert_eq!(one.findings[0].message, "Only 4 votes");

        let none = t
            .lint(&LintFilter { eid: None, severity: Some(Severity::Error) })
            .await
            .unwrap();
        assert!(none.findings.is_empty());
    }
}
