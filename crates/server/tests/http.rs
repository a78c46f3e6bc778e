//! HTTP contract tests: the router over in-memory stores and a fixed clock.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use linter_rules::retry::RetryPolicy;
use linter_rules::schema::RuleStatus;
use linter_rules::{Condition, FixedClock, LinterRule, MemoryStore, RuleTester, Severity};
use linter_server::{build_router, AppState};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn rule(id: &str, severity: Severity, conditions: Vec<Condition>) -> LinterRule {
    LinterRule {
        rule_id: id.into(),
        name: format!("Rule {id}"),
        description: Some("test rule".into()),
        severity,
        category: Some("operations".into()),
        context: None,
        status: RuleStatus::Active,
        conditions,
        message: Some("{{eid}} needs attention".into()),
    }
}

fn store() -> MemoryStore {
    let started = |d: i64| (now() - Duration::days(d)).to_rfc3339();
    MemoryStore::new()
        .with_rules(vec![
            rule(
                "stale-event",
                Severity::Warning,
                vec![Condition::new("event_start_datetime", "past_days").with_value(14)],
            ),
            rule(
                "no-venue",
                Severity::Error,
                vec![Condition::new("venue", "is_empty")],
            ),
        ])
        .with_events(vec![
            json!({ "eid": "AB3001", "name": "Old", "venue": "Hall", "event_start_datetime": started(20) }),
            json!({ "eid": "AB3002", "name": "Recent", "venue": "", "event_start_datetime": started(5) }),
        ])
}

fn app_with(store: MemoryStore) -> Router {
    let store = Arc::new(store);
    let tester = RuleTester::new(store.clone(), store.clone(), store)
        .with_clock(Arc::new(FixedClock(now())))
        .with_retry(RetryPolicy::none());
    build_router(Arc::new(AppState::new(tester)))
}

fn app() -> Router {
    app_with(store())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn get_runs_rule_test() {
    let (status, body) = send(app(), get("/?rule_id=stale-event")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["rule_id"], "stale-event");
    assert_eq!(body["rule_name"], "Rule stale-event");
    assert_eq!(body["severity"], "warning");
    assert_eq!(body["matching_count"], 1);
    assert_eq!(body["reason"], "1 events match");
    assert_eq!(body["diagnostics"]["totalEventsChecked"], 2);
    assert_eq!(body["diagnostics"]["matchingEventsList"][0]["eid"], "AB3001");
    assert!(body["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn post_accepts_either_id_spelling() {
    let (status, body) = send(app(), post("/", r#"{"rule_id":"stale-event"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rule_id"], "stale-event");

    let (status, body) = send(app(), post("/", r#"{"ruleId":"no-venue"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rule_id"], "no-venue");
    assert_eq!(body["matching_count"], 1);
}

#[tokio::test]
async fn query_id_wins_over_body() {
    let (status, body) = send(
        app(),
        post("/?rule_id=no-venue", r#"{"rule_id":"stale-event"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rule_id"], "no-venue");
}

#[tokio::test]
async fn legacy_path_is_mounted() {
    let (status, body) = send(app(), get("/test-linter-rule?rule_id=stale-event")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matching_count"], 1);
}

#[tokio::test]
async fn missing_id_is_bad_request() {
    let (status, body) = send(app(), get("/")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "rule_id is required");
    assert_eq!(body["stack"], "rule_id is required");

    let (status, body) = send(app(), post("/", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "rule_id is required");
}

#[tokio::test]
async fn unknown_rule_is_bad_request() {
    let (status, body) = send(app(), get("/?rule_id=nope")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rule nope not found or not active");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (status, body) = send(app(), post("/", "{rule_id:")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn store_failure_reports_cause_chain() {
    let (status, body) = send(
        app_with(store().with_event_failures(1)),
        get("/?rule_id=stale-event"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Failed to fetch events: request failed: connection reset"
    );
    assert_eq!(
        body["stack"],
        "Failed to fetch events: request failed: connection reset\nrequest failed: connection reset"
    );
}

#[tokio::test]
async fn preflight_allows_client_headers() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/")
        .header(header::ORIGIN, "https://admin.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "apikey, x-client-info")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    for name in ["authorization", "x-client-info", "apikey", "content-type"] {
        assert!(allowed.contains(name), "{name} not in {allowed}");
    }
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn bare_options_is_empty_ok() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn responses_carry_cors_origin() {
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://admin.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn lint_reports_findings() {
    let (status, body) = send(app(), get("/lint")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rules_evaluated"], 2);
    assert_eq!(body["events_checked"], 2);

    let findings = body["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 2);
    // Errors sort ahead of warnings.
    assert_eq!(findings[0]["ruleId"], "no-venue");
    assert_eq!(findings[0]["message"], "AB3002 needs attention");
    assert_eq!(findings[1]["ruleId"], "stale-event");
    assert_eq!(body["summary"]["error"], 1);
    assert_eq!(body["summary"]["warning"], 1);
}

#[tokio::test]
async fn lint_filters() {
    let (_, body) = send(app(), get("/lint?severity=warning")).await;
    assert_eq!(body["rules_evaluated"], 1);
    let findings = body["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["ruleId"], "stale-event");

    let (_, body) = send(app(), get("/lint?eid=AB3002")).await;
    let findings = body["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["eventEid"], "AB3002");
}

#[tokio::test]
async fn health() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}
