//! API response envelope helpers
//!
//! Every endpoint wraps its payload as `{ "code": "api.ok", "data": ..,
//! "meta": .. }`; error responses carry `{ "code": .., "message": .. }`.

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Error body shape returned by the platform on application failures
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Best-effort parse; a non-JSON or shapeless body yields no code
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or(Self {
            code: None,
            message: None,
        })
    }
}

/// Extract the `data` payload from a success envelope, if any
pub fn data_of(envelope: JsonValue) -> Option<JsonValue> {
    match envelope {
        JsonValue::Object(mut map) => match map.remove("data") {
            Some(JsonValue::Null) | None => None,
            Some(data) => Some(data),
        },
        _ => None,
    }
}
