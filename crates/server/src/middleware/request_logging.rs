use axum::{extract::Request, middleware::Next, response::Response};
use hello_actions_core::context::RequestContext;

/// Middleware that logs request/response. Runs inside the diagnostic scope,
/// so correlation id, endpoint, method and client IP ride along on both lines.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let ctx = request.extensions().get::<RequestContext>().cloned();
    let query = request.uri().query().map(str::to_string);

    tracing::info!(query = query.as_deref().unwrap_or("-"), "Request received");

    let response = next.run(request).await;

    let elapsed_ms = ctx.as_ref().map(|c| c.elapsed_ms()).unwrap_or(0);
    let status = response.status().as_u16();

    if status >= 500 {
        tracing::warn!(status, elapsed_ms, "Request completed");
    } else {
        tracing::info!(status, elapsed_ms, "Request completed");
    }

    response
}
