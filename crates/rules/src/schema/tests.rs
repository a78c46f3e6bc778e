//! Tests for schema types.

use super::*;

const DB_ROW_JSON: &str = r#"{
    "id": "0b7f7a52-3c5e-4a57-9a43-0d1f0e0c9a11",
    "rule_id": "voting-closed-no-winner",
    "name": "Voting closed without winner",
    "description": "Event ended but no winner was recorded",
    "severity": "warning",
    "category": "operations",
    "context": "post_event",
    "status": "active",
    "hit_count": 42,
    "message": "{{name}} ended {{days_ago}} days ago with no winner",
    "conditions": [
        { "field": "event_end_datetime", "operator": "past_days", "value": 2 },
        { "field": "winner_art_id", "operator": "is_null" },
        { "field": "ticket_revenue", "operator": "greater_than_percent", "value": 50, "compare_to": "prev_ticket_revenue" }
    ]
}"#;

const YAML_RULES: &str = r#"
- rule_id: upcoming-no-venue
  name: Upcoming event without venue
  severity: error
  category: setup
  conditions:
    - field: event_start_datetime
      operator: upcoming_days
      value: 14
    - field: venue
      operator: is_empty
- rule_id: legacy-rule
  name: Legacy rule
  severity: critical
  status: inactive
  conditions: ~
"#;

#[test]
fn parse_database_row() {
    let rule: LinterRule = serde_json::from_str(DB_ROW_JSON).unwrap();

    assert_eq!(rule.rule_id, "voting-closed-no-winner");
    assert_eq!(rule.severity, Severity::Warning);
    assert!(rule.is_active());
    assert_eq!(rule.conditions.len(), 3);

    assert_eq!(rule.conditions[0].operator, Operator::PastDays);
    assert_eq!(rule.conditions[0].value, Some(serde_json::json!(2)));
    assert_eq!(rule.conditions[1].operator, Operator::IsNull);
    assert!(rule.conditions[1].value.is_none());
    assert_eq!(
        rule.conditions[2].compare_to.as_deref(),
        Some("prev_ticket_revenue")
    );
}

#[test]
fn parse_yaml_rules() {
    let rules: Vec<LinterRule> = serde_yaml::from_str(YAML_RULES).unwrap();

    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].rule_id, "upcoming-no-venue");
    assert_eq!(rules[0].severity, Severity::Error);
    assert_eq!(rules[0].conditions[1].operator, Operator::IsEmpty);

    assert_eq!(rules[1].severity, Severity::Other("critical".to_string()));
    assert_eq!(rules[1].status, RuleStatus::Inactive);
    assert!(rules[1].conditions.is_empty(), "null conditions become empty");
}

#[test]
fn unknown_operator_is_kept_not_rejected() {
    let cond: Condition =
        serde_json::from_str(r#"{"field":"ticket_sales","operator":"gt","value":0}"#).unwrap();
    assert_eq!(cond.operator, Operator::Unsupported("gt".to_string()));
    assert_eq!(cond.operator.as_str(), "gt");
}

#[test]
fn operator_names_round_trip_through_strings() {
    for name in [
        "equals",
        "not_equals",
        "is_null",
        "is_not_null",
        "greater_than",
        "less_than",
        "gte",
        "lte",
        "before",
        "greater_than_percent",
        "less_than_percent",
        "past_minutes",
        "past_hours",
        "past_days",
        "within_days",
        "upcoming_minutes",
        "upcoming_hours",
        "upcoming_days",
        "upcoming_days_more_than",
        "is_empty",
        "is_not_empty",
    ] {
        let op = Operator::from(name);
        assert!(!matches!(op, Operator::Unsupported(_)), "{name} should be known");
        assert_eq!(String::from(op), name);
    }
}

#[test]
fn null_severity_and_status_use_defaults() {
    let rule: LinterRule = serde_json::from_str(
        r#"{"rule_id":"r","name":"R","severity":null,"status":null,"conditions":null}"#,
    )
    .unwrap();
    assert_eq!(rule.severity, Severity::Info);
    assert_eq!(rule.status, RuleStatus::Active);
    assert!(rule.conditions.is_empty());
}

#[test]
fn serialized_condition_omits_absent_value() {
    let cond = Condition::new("winner_art_id", Operator::IsNull);
    let json = serde_json::to_value(&cond).unwrap();
    assert_eq!(json, serde_json::json!({"field": "winner_art_id", "operator": "is_null"}));
}

#[test]
fn severity_emoji_and_rank() {
    assert_eq!(Severity::Error.emoji(), Some("❌"));
    assert_eq!(Severity::Other("x".into()).emoji(), None);
    assert!(Severity::Error.rank() < Severity::Success.rank());
}

#[test]
fn explicit_null_value_is_kept() {
    let cond: Condition =
        serde_json::from_str(r#"{"field":"venue","operator":"equals","value":null}"#).unwrap();
    assert_eq!(cond.value, Some(serde_json::Value::Null));

    let absent: Condition = serde_json::from_str(r#"{"field":"venue","operator":"equals"}"#).unwrap();
    assert_eq!(absent.value, None);
}
