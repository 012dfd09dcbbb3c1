use axum::Json;
use chrono::NaiveDateTime;
use hello_actions_core::context::{RequestContext, timestamp};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: NaiveDateTime,
    pub correlation_id: String,
}

pub async fn health(ctx: RequestContext) -> Json<HealthResponse> {
    tracing::info!("Health check requested");

    let response = HealthResponse {
        status: "UP",
        timestamp: timestamp(),
        correlation_id: ctx.correlation_id,
    };

    tracing::info!("Health check completed successfully");
    Json(response)
}
