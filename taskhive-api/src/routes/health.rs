/// Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiResponse;

/// Health check payload
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall service status
    pub status: &'static str,

    /// Library version
    pub version: &'static str,
}

/// GET /health
///
/// Verifies database connectivity; returns 500 when the store is unreachable.
pub async fn health_check(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<HealthStatus>>> {
    taskhive_shared::db::pool::health_check(&state.db)
        .await
        .map_err(|e| ApiError::InternalError(format!("Database health check failed: {}", e)))?;

    Ok(ApiResponse::data(HealthStatus {
        status: "healthy",
        version: taskhive_shared::VERSION,
    }))
}
