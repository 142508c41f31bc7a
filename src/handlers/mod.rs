//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Waaed API.

use crate::db;
use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

pub mod attendance;
pub mod audit;
pub mod geofences;
pub mod leave;
pub mod notifications;
pub mod rbac;
pub mod tenants;
pub mod types;
pub mod users;
pub mod workflows;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness and database health probe
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service healthy", body = serde_json::Value),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    db::health_check(&state.db).await.map_err(|e| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            &format!("Database health check failed: {e}"),
        )
    })?;

    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[cfg(test)]
mod tests;
