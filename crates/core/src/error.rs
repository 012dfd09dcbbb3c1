use crate::context::timestamp;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Failure raised while handling a request.
///
/// `MissingContext` and `Internal` answer with an empty 500; `Failed` carries
/// a structured body with the correlation id so clients can find the logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request context missing from request extensions")]
    MissingContext,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{error}: {message}")]
    Failed {
        error: String,
        message: String,
        correlation_id: String,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Failed {
                error,
                message,
                correlation_id,
            } => {
                let body = json!({
                    "error": error,
                    "message": message,
                    "correlationId": correlation_id,
                    "timestamp": timestamp(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body")
            .to_vec()
    }

    #[tokio::test]
    async fn test_internal_error_has_empty_body() {
        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_bytes(response).await.is_empty());

        let response = ApiError::MissingContext.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_error_has_structured_body() {
        let response = ApiError::Failed {
            error: "Log test failed".to_string(),
            message: "Simulated error for testing".to_string(),
            correlation_id: "abc".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).expect("invalid json");
        assert_eq!(body["error"], "Log test failed");
        assert_eq!(body["message"], "Simulated error for testing");
        assert_eq!(body["correlationId"], "abc");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_display() {
        let err = ApiError::Failed {
            error: "Log test failed".to_string(),
            message: "Simulated error for testing".to_string(),
            correlation_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Log test failed: Simulated error for testing");
    }
}
