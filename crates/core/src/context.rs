use crate::diagnostic;
use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::NaiveDateTime;
use std::time::Instant;

/// Diagnostic field carrying the per-request correlation identifier.
pub const CORRELATION_ID: &str = "correlationId";
/// Diagnostic field carrying the request path.
pub const ENDPOINT: &str = "endpoint";
/// Diagnostic field carrying the HTTP method.
pub const METHOD: &str = "method";
/// Diagnostic field carrying the resolved client address.
pub const CLIENT_IP: &str = "clientIp";
/// Diagnostic field naming a lifecycle event outside of request handling.
pub const EVENT: &str = "event";

/// Response header echoing the correlation identifier.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Per-request metadata for logging and response correlation.
/// Injected as an axum `Extension` by the request context middleware and
/// extracted by handlers directly.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Fresh UUID v4 for this request.
    pub correlation_id: String,
    pub endpoint: String,
    pub method: String,
    /// Resolved client address (forwarding headers first, then the peer).
    pub client_ip: String,
    /// When the request was received.
    pub start_time: Instant,
}

impl RequestContext {
    pub fn new(
        endpoint: impl Into<String>,
        method: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            endpoint: endpoint.into(),
            method: method.into(),
            client_ip: client_ip.into(),
            start_time: Instant::now(),
        }
    }

    /// Writes the fixed request fields into the active diagnostic context.
    pub fn publish(&self) {
        diagnostic::put(CORRELATION_ID, &self.correlation_id);
        diagnostic::put(ENDPOINT, &self.endpoint);
        diagnostic::put(METHOD, &self.method);
        diagnostic::put(CLIENT_IP, &self.client_ip);
    }

    /// Returns elapsed time since request start.
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(ApiError::MissingContext)
    }
}

/// Local wall-clock time used for response timestamps (no offset).
pub fn timestamp() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique_uuids() {
        let a = RequestContext::new("/api/health", "GET", "127.0.0.1");
        let b = RequestContext::new("/api/health", "GET", "127.0.0.1");
        assert_ne!(a.correlation_id, b.correlation_id);
        let parsed = uuid::Uuid::parse_str(&a.correlation_id).expect("not a uuid");
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(a.correlation_id.len(), 36);
    }

    #[test]
    fn test_publish_fills_fixed_fields() {
        let ctx = RequestContext::new("/api/hello", "GET", "1.2.3.4");
        let fields = diagnostic::sync_scope(|| {
            ctx.publish();
            diagnostic::snapshot()
        });
        assert_eq!(fields.get(CORRELATION_ID), Some(&ctx.correlation_id));
        assert_eq!(fields.get(ENDPOINT).map(String::as_str), Some("/api/hello"));
        assert_eq!(fields.get(METHOD).map(String::as_str), Some("GET"));
        assert_eq!(fields.get(CLIENT_IP).map(String::as_str), Some("1.2.3.4"));
    }

    #[tokio::test]
    async fn test_extractor_rejects_without_extension() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let result = RequestContext::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::MissingContext)));

        let ctx = RequestContext::new("/api/health", "GET", "unknown");
        parts.extensions.insert(ctx.clone());
        let extracted = RequestContext::from_request_parts(&mut parts, &())
            .await
            .expect("context should be extracted");
        assert_eq!(extracted.correlation_id, ctx.correlation_id);
    }
}
