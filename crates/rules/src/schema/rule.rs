//! Linter rule rows: identity, severity, status and the condition list.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{null_as_default, Condition};

/// A declarative linter rule as stored in the rule table.
///
/// Database rows carry extra bookkeeping columns (ids, hit counters,
/// timestamps); unknown fields are ignored so those rows load as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinterRule {
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Severity,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RuleStatus,
    /// Conditions are ANDed. A rule without conditions is evaluated elsewhere
    /// (database functions) and never matches here.
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<Condition>,
    /// Finding message template with `{{ field }}` placeholders.
    #[serde(default)]
    pub message: Option<String>,
}

impl LinterRule {
    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }
}

// ── Severity ────────────────────────────────────────────────────────

/// Finding severity. Unknown stored values are preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Error,
    Warning,
    Reminder,
    #[default]
    Info,
    Success,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Reminder => "reminder",
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Other(s) => s,
        }
    }

    pub fn emoji(&self) -> Option<&'static str> {
        match self {
            Severity::Error => Some("❌"),
            Severity::Warning => Some("⚠️"),
            Severity::Reminder => Some("🔔"),
            Severity::Info => Some("📊"),
            Severity::Success => Some("✅"),
            Severity::Other(_) => None,
        }
    }

    /// Sort rank for findings: error first, unknown severities last.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Reminder => 2,
            Severity::Info => 3,
            Severity::Success => 4,
            Severity::Other(_) => 5,
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            "reminder" => Severity::Reminder,
            "info" => Severity::Info,
            "success" => Severity::Success,
            _ => Severity::Other(s),
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        Severity::from(s.to_string())
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Publication status of a rule. Only `active` rules are evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
    Other(String),
}

impl From<String> for RuleStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => RuleStatus::Active,
            "inactive" => RuleStatus::Inactive,
            _ => RuleStatus::Other(s),
        }
    }
}

impl From<RuleStatus> for String {
    fn from(s: RuleStatus) -> Self {
        match s {
            RuleStatus::Active => "active".to_string(),
            RuleStatus::Inactive => "inactive".to_string(),
            RuleStatus::Other(s) => s,
        }
    }
}
