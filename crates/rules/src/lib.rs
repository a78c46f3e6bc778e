//! Event linter rule evaluation.
//!
//! This crate provides:
//! - Rule schema with serde deserialization from database rows or YAML
//! - Dot-path field resolution and typed, fail-closed condition operators
//! - Batch evaluation with match / near-match / zero-match diagnostics
//! - Batch metric enrichment behind a store trait
//! - Rule-test and lint runners with retry and a run budget

pub mod clock;
pub mod enrichment;
pub mod error;
pub mod evaluator;
pub mod findings;
pub mod loader;
pub mod retry;
pub mod runner;
pub mod schema;
pub mod selection;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::RuleTestError;
pub use evaluator::{Diagnostics, RuleEvaluator};
pub use findings::{Finding, LintFilter, LintReport};
pub use runner::{RuleTestReport, RuleTester};
pub use schema::{Condition, LinterRule, Operator, Severity};
pub use store::{MemoryStore, MetricsStore, RecordStore, RuleStore, StoreError};
