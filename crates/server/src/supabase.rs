//! PostgREST (Supabase REST) implementations of the rule, record and
//! metrics stores.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use linter_core::BackendConfig;
use linter_rules::enrichment::EventMetrics;
use linter_rules::{LinterRule, MetricsStore, RecordStore, RuleStore, StoreError};

/// One client for all three stores. Every request carries the project key
/// both as `apikey` and as a bearer token.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    base: Url,
    api_key: String,
    rules_table: String,
    events_table: String,
    metrics_rpc: String,
}

impl SupabaseStore {
    pub fn from_config(config: &BackendConfig) -> Result<Self, StoreError> {
        let (Some(url), Some(api_key)) = (config.url.as_deref(), config.api_key.as_deref()) else {
            return Err(StoreError::NotConfigured);
        };

        let mut base = Url::parse(url)
            .map_err(|e| StoreError::Transport(format!("invalid backend url {url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base,
            api_key: api_key.to_string(),
            rules_table: config.rules_table.clone(),
            events_table: config.events_table.clone(),
            metrics_rpc: config.metrics_rpc.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(&format!("rest/v1/{path}"))
            .map_err(|e| StoreError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    /// Active rules, optionally narrowed to one id.
    fn rules_url(&self, rule_id: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.endpoint(&self.rules_table)?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("select", "*");
            match rule_id {
                Some(id) => {
                    q.append_pair("rule_id", &format!("eq.{id}"));
                    q.append_pair("status", "eq.active");
                }
                None => {
                    q.append_pair("status", "eq.active");
                    q.append_pair("order", "category.asc");
                }
            }
        }
        Ok(url)
    }

    fn events_url(&self, limit: usize) -> Result<Url, StoreError> {
        let mut url = self.endpoint(&self.events_table)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }

    fn metrics_url(&self) -> Result<Url, StoreError> {
        self.endpoint(&format!("rpc/{}", self.metrics_rpc))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let resp = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RuleStore for SupabaseStore {
    async fn active_rule(&self, rule_id: &str) -> Result<Option<LinterRule>, StoreError> {
        let url = self.rules_url(Some(rule_id))?;
        debug!(%url, "Fetching rule");
        let rows: Vec<LinterRule> = self.send(self.client.get(url)).await?;
        Ok(rows.into_iter().next())
    }

    async fn active_rules(&self) -> Result<Vec<LinterRule>, StoreError> {
        let url = self.rules_url(None)?;
        debug!(%url, "Fetching active rules");
        self.send(self.client.get(url)).await
    }
}

#[async_trait::async_trait]
impl RecordStore for SupabaseStore {
    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, StoreError> {
        let url = self.events_url(limit)?;
        debug!(%url, "Fetching events");
        self.send(self.client.get(url)).await
    }
}

#[async_trait::async_trait]
impl MetricsStore for SupabaseStore {
    async fn batch_event_metrics(&self, eids: &[String]) -> Result<Vec<EventMetrics>, StoreError> {
        let url = self.metrics_url()?;
        debug!(%url, eids = eids.len(), "Fetching batch metrics");
        self.send(self.client.post(url).json(&json!({ "p_eids": eids })))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>, key: Option<&str>) -> BackendConfig {
        BackendConfig {
            url: url.map(str::to_string),
            api_key: key.map(str::to_string),
            rules_table: "event_linter_rules".into(),
            events_table: "events".into(),
            metrics_rpc: "get_batch_event_metrics".into(),
            timeout_ms: 5_000,
        }
    }

    fn store() -> SupabaseStore {
        SupabaseStore::from_config(&config(Some("https://proj.supabase.co"), Some("key"))).unwrap()
    }

    #[test]
    fn requires_url_and_key() {
        assert!(matches!(
            SupabaseStore::from_config(&config(None, Some("key"))),
            Err(StoreError::NotConfigured)
        ));
        assert!(matches!(
            SupabaseStore::from_config(&config(Some("https://proj.supabase.co"), None)),
            Err(StoreError::NotConfigured)
        ));
    }

    #[test]
    fn rejects_bad_url() {
        assert!(matches!(
            SupabaseStore::from_config(&config(Some("not a url"), Some("key"))),
            Err(StoreError::Transport(_))
        ));
    }

    #[test]
    fn rule_urls() {
        let s = store();
        assert_eq!(
            s.rules_url(Some("late-start")).unwrap().as_str(),
            "https://proj.supabase.co/rest/v1/event_linter_rules?select=*&rule_id=eq.late-start&status=eq.active"
        );
        assert_eq!(
            s.rules_url(None).unwrap().as_str(),
            "https://proj.supabase.co/rest/v1/event_linter_rules?select=*&status=eq.active&order=category.asc"
        );
    }

    #[test]
    fn event_and_metrics_urls() {
        let s = store();
        assert_eq!(
            s.events_url(1000).unwrap().as_str(),
            "https://proj.supabase.co/rest/v1/events?select=*&limit=1000"
        );
        assert_eq!(
            s.metrics_url().unwrap().as_str(),
            "https://proj.supabase.co/rest/v1/rpc/get_batch_event_metrics"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let s = SupabaseStore::from_config(&config(Some("http://localhost:54321/api"), Some("k")))
            .unwrap();
        assert_eq!(
            s.events_url(5).unwrap().as_str(),
            "http://localhost:54321/api/rest/v1/events?select=*&limit=5"
        );
    }
}
