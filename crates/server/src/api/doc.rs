//! OpenAPI documentation served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "event-linter API",
        version = "0.1.0",
        description = "Rule tester and linter for event records.",
    ),
    tags(
        (name = "Rule Tester", description = "Run one linter rule and return match diagnostics"),
        (name = "Lint", description = "Run every active rule and return findings"),
        (name = "Health", description = "Server liveness"),
    ),
    paths(
        crate::api::test_rule::test_rule_get,
        crate::api::test_rule::test_rule_post,
        crate::api::lint::lint,
        crate::api::health::health,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::HealthResponse,
        crate::api::TestRuleBody,
    ))
)]
pub struct ApiDoc;
