//! HTTP handlers.
//!
//! Every failure is answered with `400 { error, stack }`, where `stack`
//! lists the error and its causes one per line.

mod doc;
mod health;
mod lint;
mod test_rule;

pub use doc::ApiDoc;
pub use health::{health, HealthResponse};
pub use lint::{lint, LintParams};
pub use test_rule::{test_rule_get, test_rule_post, TestRuleBody, TestRuleParams};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use linter_rules::RuleTestError;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub stack: String,
}

#[derive(Debug)]
pub struct ApiError(ErrorResponse);

impl ApiError {
    pub(crate) fn bad_request(error: impl Into<String>, stack: impl Into<String>) -> Self {
        Self(ErrorResponse {
            error: error.into(),
            stack: stack.into(),
        })
    }
}

impl From<RuleTestError> for ApiError {
    fn from(e: RuleTestError) -> Self {
        Self::bad_request(e.to_string(), e.chain().join("\n"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self.0)).into_response()
    }
}
