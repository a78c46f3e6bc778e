//! In-memory store used by the offline `check` command and tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use super::{MetricsStore, RecordStore, RuleStore, StoreError};
use crate::enrichment::EventMetrics;
use crate::schema::LinterRule;

/// Rules, events and metrics held in memory.
///
/// Counts metrics calls and can be told to fail, so callers can check the
/// single-batch and degrade-on-error behavior.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rules: Vec<LinterRule>,
    events: Vec<Value>,
    metrics: Vec<EventMetrics>,
    metrics_calls: AtomicUsize,
    metrics_down: bool,
    metrics_failures: AtomicUsize,
    event_failures: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: Vec<LinterRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_events(mut self, events: Vec<Value>) -> Self {
        self.events = events;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<EventMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Every metrics call fails.
    pub fn with_metrics_down(mut self) -> Self {
        self.metrics_down = true;
        self
    }

    /// The next `n` metrics calls fail before succeeding.
    pub fn with_metrics_failures(self, n: usize) -> Self {
        self.metrics_failures.store(n, Ordering::SeqCst);
        self
    }

    /// The next `n` event fetches fail before succeeding.
    pub fn with_event_failures(self, n: usize) -> Self {
        self.event_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn metrics_calls(&self) -> usize {
        self.metrics_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RuleStore for MemoryStore {
    async fn active_rule(&self, rule_id: &str) -> Result<Option<LinterRule>, StoreError> {
        Ok(self
            .rules
            .iter()
            .find(|r| r.rule_id == rule_id && r.is_active())
            .cloned())
    }

    async fn active_rules(&self) -> Result<Vec<LinterRule>, StoreError> {
        let mut rules: Vec<LinterRule> =
            self.rules.iter().filter(|r| r.is_active()).cloned().collect();
        // Postgres sorts NULL categories last.
        rules.sort_by(|a, b| match (&a.category, &b.category) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(rules)
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, StoreError> {
        let pending = self.event_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.event_failures.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::Transport("connection reset".into()));
        }
        Ok(self.events.iter().take(limit).cloned().collect())
    }
}

#[async_trait::async_trait]
impl MetricsStore for MemoryStore {
    async fn batch_event_metrics(&self, eids: &[String]) -> Result<Vec<EventMetrics>, StoreError> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        if self.metrics_down {
            return Err(StoreError::Status {
                status: 503,
                body: "metrics function unavailable".into(),
            });
        }
        let pending = self.metrics_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.metrics_failures.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::Transport("statement timeout".into()));
        }
        Ok(self
            .metrics
            .iter()
            .filter(|m| eids.contains(&m.eid))
            .cloned()
            .collect())
    }
}
