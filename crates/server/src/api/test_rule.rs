//! Rule-test endpoint: run one rule against the current event batch.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use linter_rules::RuleTestReport;

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct TestRuleParams {
    /// Rule to test. Wins over any id in the request body.
    pub rule_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct TestRuleBody {
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default, rename = "ruleId")]
    pub rule_id_camel: Option<String>,
}

impl TestRuleBody {
    fn into_rule_id(self) -> Option<String> {
        self.rule_id.or(self.rule_id_camel)
    }
}

/// Test a rule given as `?rule_id=`.
#[utoipa::path(
    get,
    path = "/",
    tag = "Rule Tester",
    params(TestRuleParams),
    responses(
        (status = 200, description = "Rule test report with diagnostics", body = Object),
        (status = 400, description = "Missing id, unknown rule or backend failure", body = super::ErrorResponse)
    )
)]
pub async fn test_rule_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TestRuleParams>,
) -> Result<Json<RuleTestReport>, ApiError> {
    run(&state, params.rule_id.as_deref().unwrap_or_default()).await
}

/// Test a rule given in the JSON body as `rule_id` or `ruleId`.
#[utoipa::path(
    post,
    path = "/",
    tag = "Rule Tester",
    params(TestRuleParams),
    request_body = TestRuleBody,
    responses(
        (status = 200, description = "Rule test report with diagnostics", body = Object),
        (status = 400, description = "Missing id, bad JSON, unknown rule or backend failure", body = super::ErrorResponse)
    )
)]
pub async fn test_rule_post(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TestRuleParams>,
    body: Bytes,
) -> Result<Json<RuleTestReport>, ApiError> {
    let rule_id = match params.rule_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => rule_id_from_body(&body)?,
    };
    run(&state, &rule_id).await
}

fn rule_id_from_body(body: &[u8]) -> Result<String, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(String::new());
    }
    let parsed: TestRuleBody = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}"), e.to_string()))?;
    Ok(parsed.into_rule_id().unwrap_or_default())
}

async fn run(state: &AppState, rule_id: &str) -> Result<Json<RuleTestReport>, ApiError> {
    info!(rule_id, "Testing rule");
    match state.tester.test_rule(rule_id).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!(rule_id, error = %e, "Rule test failed");
            Err(e.into())
        }
    }
}
