//! Merging batch metrics into records.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::types::EventMetrics;
use crate::retry::RetryPolicy;
use crate::store::MetricsStore;

/// Distinct string `eid`s in record order. Records without one are skipped.
pub fn collect_eids(records: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.get("eid").and_then(Value::as_str))
        .filter(|eid| !eid.is_empty() && seen.insert(*eid))
        .map(String::from)
        .collect()
}

/// Add metric fields to every record with a matching `eid`.
///
/// Only keys the record does not already carry are added, so source
/// columns always win over derived metrics. Returns how many records
/// received metrics.
pub fn merge_metrics(records: &mut [Value], metrics: Vec<EventMetrics>) -> usize {
    let by_eid: HashMap<String, EventMetrics> =
        metrics.into_iter().map(|m| (m.eid.clone(), m)).collect();

    let mut enriched = 0;
    for record in records.iter_mut() {
        let Some(eid) = record.get("eid").and_then(Value::as_str) else {
            continue;
        };
        let Some(metrics) = by_eid.get(eid) else {
            continue;
        };
        let Some(obj) = record.as_object_mut() else {
            continue;
        };
        for (key, value) in metrics.fields() {
            obj.entry(key).or_insert(value);
        }
        enriched += 1;
    }
    enriched
}

/// Fetch metrics for all records in one batch call and merge them in.
///
/// The call goes through `retry`. Once the attempts are used up the
/// failure is logged and the records are left unenriched.
pub async fn enrich<M: MetricsStore + ?Sized>(
    store: &M,
    retry: &RetryPolicy,
    records: &mut [Value],
) -> usize {
    let eids = collect_eids(records);
    if eids.is_empty() {
        tracing::debug!("No eids to enrich");
        return 0;
    }

    let keys = eids.as_slice();
    match retry
        .run("batch_event_metrics", || store.batch_event_metrics(keys))
        .await
    {
        Ok(metrics) => {
            let rows = metrics.len();
            let enriched = merge_metrics(records, metrics);
            tracing::info!(eids = eids.len(), rows, enriched, "Merged batch event metrics");
            enriched
        }
        Err(e) => {
            tracing::warn!(error = %e, eids = eids.len(), "Batch metrics lookup failed, continuing unenriched");
            0
        }
    }
}
