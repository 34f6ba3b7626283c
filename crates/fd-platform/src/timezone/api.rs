//! Timezones API

use axum::{
    extract::{State, Path},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use std::sync::Arc;

use crate::shared::error::{PlatformError, ErrorResponse};
use crate::shared::middleware::Authenticated;
use crate::timezone::entity::{TimezoneResponse, CreateTimezoneRequest};
use crate::timezone::registry::TimezoneRegistry;

/// Timezones service state
#[derive(Clone)]
pub struct TimezonesState {
    pub registry: Arc<TimezoneRegistry>,
}

/// List all timezones
#[utoipa::path(
    get,
    path = "",
    tag = "timezones",
    operation_id = "getV1Timezones",
    responses(
        (status = 200, description = "List of timezones", body = Vec<TimezoneResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_timezones(
    State(state): State<TimezonesState>,
    _auth: Authenticated,
) -> Result<Json<Vec<TimezoneResponse>>, PlatformError> {
    let timezones = state.registry.list().await?;
    Ok(Json(timezones.into_iter().map(TimezoneResponse::from).collect()))
}

/// Get timezone by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "timezones",
    operation_id = "getV1TimezonesById",
    params(
        ("id" = String, Path, description = "Timezone ID")
    ),
    responses(
        (status = 200, description = "Timezone found", body = TimezoneResponse),
        (status = 404, description = "Timezone not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_timezone(
    State(state): State<TimezonesState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<TimezoneResponse>, PlatformError> {
    let timezone = state.registry.get(&id).await?;
    Ok(Json(timezone.into()))
}

/// Register a new timezone
#[utoipa::path(
    post,
    path = "",
    tag = "timezones",
    operation_id = "postV1Timezones",
    request_body = CreateTimezoneRequest,
    responses(
        (status = 201, description = "Timezone created", body = TimezoneResponse),
        (status = 400, description = "Blank timezone name", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Timezone already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_timezone(
    State(state): State<TimezonesState>,
    auth: Authenticated,
    Json(req): Json<CreateTimezoneRequest>,
) -> Result<(StatusCode, Json<TimezoneResponse>), PlatformError> {
    let timezone = state.registry.register(&auth.0, &req.timezone).await?;
    Ok((StatusCode::CREATED, Json(timezone.into())))
}

pub fn timezones_router(state: TimezonesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_timezones, create_timezone))
        .routes(routes!(get_timezone))
        .with_state(state)
}
