pub mod handler;
pub mod middleware;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Router, middleware as axum_mw};
use hello_actions_core::config::Config;
use hello_actions_core::error::ApiError;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(handler::health::health))
        .route("/api/hello", get(handler::hello::hello))
        .route("/api/log-test", post(handler::log_test::log_test))
        .fallback(not_found);

    // Global middleware layers (outer → inner): trace, diagnostic scope,
    // request logging, panic capture, body limit
    api_routes
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes()))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum_mw::from_fn(
            middleware::request_logging::request_logging_middleware,
        ))
        .layer(axum_mw::from_fn(
            middleware::request_context::request_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> StatusCode {
    tracing::warn!("No route matched");
    StatusCode::NOT_FOUND
}

/// Turns a handler panic into the same empty 500 as any other internal fault.
/// Runs inside the diagnostic scope, so the error line carries the request
/// fields.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
