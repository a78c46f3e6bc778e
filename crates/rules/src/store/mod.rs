//! Repository traits for rules, event records and batch metrics.
//!
//! The server crate implements these against the PostgREST backend using
//! reqwest. The rules crate only depends on the traits, so evaluation runs
//! can be driven from files or in-memory fixtures in tests.

mod memory;

pub use memory::MemoryStore;

use serde_json::Value;

use crate::enrichment::EventMetrics;
use crate::schema::LinterRule;

/// Errors surfaced by a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("backend not configured")]
    NotConfigured,
}

/// Source of linter rules.
#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    /// The rule with `rule_id`, only if it is active.
    async fn active_rule(&self, rule_id: &str) -> Result<Option<LinterRule>, StoreError>;

    /// Every active rule, ordered by category.
    async fn active_rules(&self) -> Result<Vec<LinterRule>, StoreError>;
}

/// Source of candidate event records.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Up to `limit` events in backend order.
    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, StoreError>;
}

/// Batch metrics lookup keyed by event external id.
#[async_trait::async_trait]
pub trait MetricsStore: Send + Sync {
    /// One call for the whole batch. Events without metrics are simply absent.
    async fn batch_event_metrics(&self, eids: &[String]) -> Result<Vec<EventMetrics>, StoreError>;
}
