/// API route handlers
///
/// Every endpoint responds with the same envelope:
///
/// ```json
/// { "success": true, "message": "...", "data": { ... } }
/// ```
///
/// `message` and `data` are omitted when absent. Errors use the same shape
/// with `success: false` (see [`crate::error::ApiError`]).

pub mod auth;
pub mod health;
pub mod member;
pub mod organization;
pub mod project;
pub mod task;

use axum::Json;
use serde::Serialize;

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always true for successful responses
    pub success: bool,

    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success with payload only
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    /// Success with message and payload
    pub fn message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_envelope_omits_absent_fields() {
        let Json(envelope) = ApiResponse::data(json!({"id": 1}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn test_envelope_with_message() {
        let Json(envelope) = ApiResponse::message("Created", json!({"id": 1}));
        let value: Value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["message"], json!("Created"));
        assert_eq!(value["data"]["id"], json!(1));
    }
}
