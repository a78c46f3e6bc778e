use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub evaluator: EvaluatorConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `LINTER_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("LINTER_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            backend: BackendConfig::from_env_profiled(p),
            evaluator: EvaluatorConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}, cors={}", self.server.host, self.server.port, self.server.cors_origin);
        tracing::info!(
            "  backend:     url={}, key={}, rules={}, events={}, rpc={}",
            self.backend.url.as_deref().unwrap_or("(none)"),
            if self.backend.api_key.is_some() { "set" } else { "(none)" },
            self.backend.rules_table,
            self.backend.events_table,
            self.backend.metrics_rpc,
        );
        tracing::info!(
            "  evaluator:   limit={}, lookback={}d, budget={}s, retries={}",
            self.evaluator.event_limit,
            self.evaluator.lookback_days,
            self.evaluator.run_budget_secs,
            self.evaluator.retry_attempts,
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "backend": {
                "url": self.backend.url,
                "configured": self.backend.is_configured(),
                "rules_table": self.backend.rules_table,
                "events_table": self.backend.events_table,
                "metrics_rpc": self.backend.metrics_rpc,
            },
            "evaluator": {
                "event_limit": self.evaluator.event_limit,
                "lookback_days": self.evaluator.lookback_days,
                "run_budget_secs": self.evaluator.run_budget_secs,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Backend (Supabase / PostgREST) ────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: Option<String>,
    /// Service-role key when present, anon key otherwise.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub rules_table: String,
    pub events_table: String,
    pub metrics_rpc: String,
    pub timeout_ms: u64,
}

impl BackendConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "SUPABASE_URL"),
            api_key: profiled_env_opt(p, "SUPABASE_SERVICE_ROLE_KEY")
                .or_else(|| profiled_env_opt(p, "SUPABASE_ANON_KEY")),
            rules_table: profiled_env_or(p, "LINTER_RULES_TABLE", "event_linter_rules"),
            events_table: profiled_env_or(p, "LINTER_EVENTS_TABLE", "events"),
            metrics_rpc: profiled_env_or(p, "LINTER_METRICS_RPC", "get_batch_event_metrics"),
            timeout_ms: profiled_env_u64(p, "BACKEND_TIMEOUT_MS", 10_000),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }
}

// ── Evaluator ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Maximum event rows fetched per run.
    pub event_limit: u32,
    /// Events starting earlier than this many days ago are ignored.
    pub lookback_days: u32,
    /// Wall-clock budget for a whole rule test.
    pub run_budget_secs: u64,
    pub retry_attempts: u32,
    pub retry_base_ms: u64,
}

impl EvaluatorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            event_limit: profiled_env_u32(p, "LINTER_EVENT_LIMIT", 1000),
            lookback_days: profiled_env_u32(p, "LINTER_LOOKBACK_DAYS", 1460),
            run_budget_secs: profiled_env_u64(p, "LINTER_RUN_BUDGET_SECS", 30),
            retry_attempts: profiled_env_u32(p, "LINTER_RETRY_ATTEMPTS", 2).max(1),
            retry_base_ms: profiled_env_u64(p, "LINTER_RETRY_BASE_MS", 200),
        }
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            event_limit: 1000,
            lookback_days: 1460,
            run_budget_secs: 30,
            retry_attempts: 2,
            retry_base_ms: 200,
        }
    }
}
