use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use linter_rules::{LintFilter, LintReport, Severity};

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct LintParams {
    /// Only lint the event with this external id.
    pub eid: Option<String>,
    /// Only report findings of this severity.
    pub severity: Option<String>,
}

impl LintParams {
    fn into_filter(self) -> LintFilter {
        let non_blank = |s: String| {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        };
        LintFilter {
            eid: self.eid.and_then(non_blank),
            severity: self.severity.and_then(non_blank).map(Severity::from),
        }
    }
}

/// Run every active rule against the selected events.
#[utoipa::path(
    get,
    path = "/lint",
    tag = "Lint",
    params(LintParams),
    responses(
        (status = 200, description = "Findings ordered by severity", body = Object),
        (status = 400, description = "Backend failure or timeout", body = super::ErrorResponse)
    )
)]
pub async fn lint(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LintParams>,
) -> Result<Json<LintReport>, ApiError> {
    let filter = params.into_filter();
    state.tester.lint(&filter).await.map(Json).map_err(|e| {
        warn!(error = %e, "Lint run failed");
        ApiError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_params_are_dropped() {
        let filter = LintParams {
            eid: Some("  ".into()),
            severity: Some("warning".into()),
        }
        .into_filter();
        assert_eq!(filter.eid, None);
        assert_eq!(filter.severity, Some(Severity::Warning));
    }
}
