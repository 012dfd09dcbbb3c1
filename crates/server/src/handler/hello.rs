use axum::Json;
use axum::extract::Query;
use chrono::NaiveDateTime;
use hello_actions_core::context::{RequestContext, timestamp};
use hello_actions_core::diagnostic;
use serde::Serialize;

const DEFAULT_NAME: &str = "World";

#[derive(Debug, Default)]
pub struct HelloParams {
    pub name: Option<String>,
}

impl HelloParams {
    /// Collects `name` from raw query pairs. Repeated values are joined with
    /// `,` so `?name=a&name=b` greets "a,b" instead of being rejected.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let names: Vec<String> = pairs
            .into_iter()
            .filter(|(key, _)| key == "name")
            .map(|(_, value)| value)
            .collect();
        Self {
            name: (!names.is_empty()).then(|| names.join(",")),
        }
    }

    /// The greeting target; a missing or empty `name` means "World".
    pub fn name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_NAME,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloResponse {
    pub message: String,
    pub timestamp: NaiveDateTime,
    pub correlation_id: String,
}

pub async fn hello(
    ctx: RequestContext,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<HelloResponse> {
    let params = HelloParams::from_pairs(pairs);
    let name = params.name();
    diagnostic::put("requestParam.name", name);

    tracing::info!("Hello request received for name: {name}");

    let response = HelloResponse {
        message: format!("Hello, {name}!"),
        timestamp: timestamp(),
        correlation_id: ctx.correlation_id,
    };

    tracing::info!("Hello request processed successfully");
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_defaults_to_world() {
        assert_eq!(HelloParams::default().name(), "World");
        let empty = HelloParams {
            name: Some(String::new()),
        };
        assert_eq!(empty.name(), "World");
        let ada = HelloParams {
            name: Some("Ada".to_string()),
        };
        assert_eq!(ada.name(), "Ada");
    }

    #[test]
    fn test_repeated_names_are_joined() {
        let pairs = vec![
            ("name".to_string(), "a".to_string()),
            ("other".to_string(), "x".to_string()),
            ("name".to_string(), "b".to_string()),
        ];
        assert_eq!(HelloParams::from_pairs(pairs).name(), "a,b");
        assert_eq!(HelloParams::from_pairs(Vec::new()).name(), "World");
    }
}
