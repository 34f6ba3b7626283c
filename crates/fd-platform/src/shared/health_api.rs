//! Health Check Endpoint
//!
//! `GET /` answers `{"status":"ok"}` without authentication.

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Health status response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    operation_id = "getHealth",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub fn health_router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(health))
}
