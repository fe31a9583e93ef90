/// Authentication endpoints
///
/// Sign-in is a token exchange: the client obtains an ID token from the
/// external identity provider and posts it to `/auth/verify-token`. The
/// server verifies the assertion, resolves (or creates) the local user, and
/// returns a short-lived session token for subsequent requests.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::{middleware::AuthContext, session};
use taskhive_shared::models::user::User;
use tracing::info;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiResponse;

/// Request body for POST /auth/verify-token
#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    /// Identity-provider ID token
    pub token: String,
}

/// Payload returned by POST /auth/verify-token
#[derive(Debug, Serialize)]
pub struct SessionPayload {
    /// The resolved user record
    pub user: User,

    /// Session token for subsequent requests
    pub token: String,
}

/// POST /auth/verify-token
///
/// Verifies an identity-provider assertion, resolves it to a local user
/// (creating or refreshing the record), and issues a session token.
pub async fn verify_token(
    State(state): State<AppState>,
    Json(body): Json<VerifyTokenRequest>,
) -> ApiResult<Json<ApiResponse<SessionPayload>>> {
    if body.token.trim().is_empty() {
        return Err(ApiError::BadRequest("Token is required".to_string()));
    }

    let assertion = state.identity.verify(&body.token).await?;

    let user = User::resolve_from_assertion(&state.db, &assertion).await?;

    let token = session::issue(user.id, &user.email, state.session_secret())?;

    info!(user_id = %user.id, "User authenticated");

    Ok(ApiResponse::message(
        "Token verified successfully",
        SessionPayload { user, token },
    ))
}

/// Payload returned by GET /auth/me
#[derive(Debug, Serialize)]
pub struct MePayload {
    /// The acting user
    pub user: User,
}

/// GET /auth/me
///
/// Returns the profile of the authenticated user.
pub async fn me(
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<MePayload>>> {
    Ok(ApiResponse::data(MePayload {
        user: context.user,
    }))
}
