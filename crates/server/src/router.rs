//! HTTP router construction.
//!
//! Mounts the rule-test handlers at `/` and `/test-linter-rule` plus the
//! lint and health endpoints. The CORS layer answers every `OPTIONS`
//! request with an empty 200.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

const ALLOWED_HEADERS: [&str; 4] = ["authorization", "x-client-info", "apikey", "content-type"];

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_origin);

    Router::new()
        .route(
            "/",
            get(api::test_rule_get).post(api::test_rule_post),
        )
        .route(
            "/test-linter-rule",
            get(api::test_rule_get).post(api::test_rule_post),
        )
        .route("/lint", get(api::lint))
        .route("/health", get(api::health))
        .layer(cors)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin, error = %e, "Invalid CORS origin, allowing any");
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
}
