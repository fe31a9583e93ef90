/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`, and every failure is rendered
/// in the standard `{success, message}` envelope.
///
/// # Status mapping
///
/// - `BadRequest`: 400
/// - `Conflict`: 400 as well. Existing clients treat duplicate-name and
///   duplicate-membership failures as plain bad requests, so 409 is not used.
/// - `Unauthorized`: 401
/// - `Forbidden`: 403
/// - `NotFound`: 404
/// - `InternalError`: 500, details logged but not exposed

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use taskhive_shared::auth::identity::IdentityError;
use taskhive_shared::models::member::MemberError;
use taskhive_shared::models::task::AssignmentError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input (400)
    BadRequest(String),

    /// Missing, invalid, or expired credential (401)
    Unauthorized(String),

    /// Authenticated but denied by policy (403)
    Forbidden(String),

    /// Referenced entity does not resolve (404)
    NotFound(String),

    /// Duplicate name/ownership/membership (400, not 409; see module docs)
    Conflict(String),

    /// Unexpected store or logic failure (500)
    InternalError(String),
}

/// Error response envelope
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    /// Always false for errors
    pub success: bool,

    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorEnvelope {
            success: false,
            message,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    if constraint.contains("name") {
                        return ApiError::Conflict("Name already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert identity verification errors to API errors
impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidAssertion(_) => ApiError::Unauthorized(err.to_string()),
            IdentityError::MalformedAssertion(_) => ApiError::BadRequest(err.to_string()),
            IdentityError::KeyFetch(msg) => {
                ApiError::InternalError(format!("Identity provider unreachable: {}", msg))
            }
        }
    }
}

/// Convert member write errors to API errors
impl From<MemberError> for ApiError {
    fn from(err: MemberError) -> Self {
        match err {
            MemberError::ProjectScopeMismatch => ApiError::BadRequest(err.to_string()),
            MemberError::Database(e) => e.into(),
        }
    }
}

/// Convert assignment resolution errors to API errors
impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::InvalidMemberSubset => ApiError::BadRequest(err.to_string()),
        }
    }
}

/// Convert session errors to API errors
impl From<taskhive_shared::auth::session::SessionError> for ApiError {
    fn from(err: taskhive_shared::auth::session::SessionError) -> Self {
        use taskhive_shared::auth::session::SessionError;
        match err {
            SessionError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            SessionError::Invalid(_) => ApiError::Unauthorized(err.to_string()),
            SessionError::Issue(msg) => ApiError::InternalError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Project not found".to_string());
        assert_eq!(err.to_string(), "Not found: Project not found");
    }

    #[test]
    fn test_conflict_maps_to_400() {
        // Kept at 400 for compatibility with existing clients.
        let response = ApiError::Conflict("Organization with this name already exists".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ApiError::InternalError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_identity_error_mapping() {
        let err: ApiError = IdentityError::InvalidAssertion("bad signature".to_string()).into();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err: ApiError = IdentityError::MalformedAssertion("email").into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_assignment_error_mapping() {
        let err: ApiError = AssignmentError::InvalidMemberSubset.into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
