/// Request authentication shared by the API server
///
/// The API layer wraps [`authenticate`] in an axum middleware: the session
/// token is taken from the `Authorization: Bearer <token>` header, verified,
/// and resolved to the acting [`User`] row, which is inserted into request
/// extensions as [`AuthContext`].
///
/// Resolving the user on every request means a token for a deleted account
/// stops working immediately, and handlers get the full profile (used by
/// `/auth/me`) without a second lookup.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use super::session::{self, SessionError};
use crate::models::user::User;

/// Authentication context added to request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The acting user, freshly loaded from the store
    pub user: User,
}

impl AuthContext {
    /// The acting user's id
    pub fn user_id(&self) -> uuid::Uuid {
        self.user.id
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Session verification failed
    #[error("Invalid or expired token")]
    InvalidToken(#[source] SessionError),

    /// Token verified but the user no longer resolves
    #[error("User not found")]
    UnknownUser,

    /// Database error while loading the user
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Authentication database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            other => (StatusCode::UNAUTHORIZED, other.to_string()),
        };

        let body = Json(json!({ "success": false, "message": message }));
        (status, body).into_response()
    }
}

/// Authenticates a request from its Authorization header value
///
/// # Errors
///
/// Returns 401-mapped errors for missing/malformed/invalid/expired
/// credentials or an unresolvable user; database failures map to 500.
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    auth_header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let claims = session::verify(token, secret).map_err(AuthError::InvalidToken)?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext { user })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_codes() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::UnknownUser.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidToken(SessionError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
