//! Batch metric enrichment for event records.
//!
//! Derived per-event metrics (artist counts, revenue, votes, ticket sales)
//! are fetched for a whole batch in a single [`MetricsStore`] call and
//! merged into the records before evaluation. Enrichment is fail-open: a
//! failed lookup logs a warning and leaves the records as they were.
//!
//! [`MetricsStore`]: crate::store::MetricsStore

mod engine;
mod types;

pub use engine::{collect_eids, enrich, merge_metrics};
pub use types::EventMetrics;
pub(crate) use types::number_value;
