//! Errors that fail a whole rule-test or lint run.
//!
//! Per-condition problems never surface here: an unknown operator or a
//! value that does not parse simply evaluates to `false`.

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RuleTestError {
    #[error("rule_id is required")]
    MissingRuleId,

    #[error("Rule {0} not found or not active")]
    RuleNotFound(String),

    #[error("Database error: {0}")]
    Database(#[source] StoreError),

    #[error("Failed to fetch events: {0}")]
    FetchEvents(#[source] StoreError),

    #[error("Run exceeded its {0}s budget")]
    Timeout(u64),
}

impl RuleTestError {
    /// Messages of this error and every underlying cause, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push(cause.to_string());
            source = cause.source();
        }
        out
    }
}
