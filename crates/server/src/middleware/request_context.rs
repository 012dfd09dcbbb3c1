use axum::extract::{ConnectInfo, FromRequestParts, Request};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use hello_actions_core::context::{CORRELATION_ID_HEADER, RequestContext};
use hello_actions_core::diagnostic;
use std::borrow::Cow;
use std::net::SocketAddr;

/// Client address reported when neither forwarding headers nor the peer
/// address are available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Middleware that opens the diagnostic scope for one request.
///
/// Creates a `RequestContext` (fresh correlation id, endpoint, method, client
/// IP), injects it as an axum Extension, publishes its fields into the
/// diagnostic context and runs the rest of the stack inside that scope. The
/// scope ends with the inner future, so the fields are gone before this
/// returns, whatever the outcome.
pub async fn request_context_middleware(request: Request, next: Next) -> Response {
    // The extractor also honours `MockConnectInfo` in router tests.
    let (mut parts, body) = request.into_parts();
    let remote_addr = ConnectInfo::<SocketAddr>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|ConnectInfo(addr)| addr);
    let client_ip = resolve_client_ip(&parts.headers, remote_addr);
    let mut request = Request::from_parts(parts, body);

    let ctx = RequestContext::new(
        request.uri().path(),
        request.method().as_str(),
        client_ip,
    );
    let correlation_id = ctx.correlation_id.clone();
    request.extensions_mut().insert(ctx.clone());

    let mut response = diagnostic::scope(async move {
        ctx.publish();
        next.run(request).await
    })
    .await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

/// Resolve the client address: first entry of `X-Forwarded-For`, then
/// `X-Real-IP`, then the transport peer. Empty headers count as absent.
pub fn resolve_client_ip(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        return forwarded
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
    }

    if let Some(real_ip) = header_value(headers, "x-real-ip") {
        return real_ip.into_owned();
    }

    remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Non-UTF-8 bytes are replaced rather than dropping the header.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .filter(|v| !v.is_empty())
}
