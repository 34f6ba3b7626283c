//! Roles API
//!
//! REST endpoints for the role registry.

use axum::{
    extract::{State, Path},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use std::sync::Arc;

use crate::role::entity::{RoleResponse, CreateRoleRequest};
use crate::role::registry::RoleRegistry;
use crate::shared::error::{PlatformError, ErrorResponse};
use crate::shared::middleware::Authenticated;

/// Roles service state
#[derive(Clone)]
pub struct RolesState {
    pub registry: Arc<RoleRegistry>,
}

/// List roles (first 20)
#[utoipa::path(
    get,
    path = "",
    tag = "user_roles",
    operation_id = "getV1UserRoles",
    responses(
        (status = 200, description = "List of roles", body = Vec<RoleResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_roles(
    State(state): State<RolesState>,
    _auth: Authenticated,
) -> Result<Json<Vec<RoleResponse>>, PlatformError> {
    let roles = state.registry.list().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

/// Get role by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "user_roles",
    operation_id = "getV1UserRolesById",
    params(
        ("id" = String, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role found", body = RoleResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_role(
    State(state): State<RolesState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<RoleResponse>, PlatformError> {
    let role = state.registry.get(&id).await?;
    Ok(Json(role.into()))
}

/// Register a new role
#[utoipa::path(
    post,
    path = "",
    tag = "user_roles",
    operation_id = "postV1UserRoles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 400, description = "Blank role name", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Role already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_role(
    State(state): State<RolesState>,
    auth: Authenticated,
    Json(req): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), PlatformError> {
    let role = state.registry.register(&auth.0, &req.role).await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

/// Create the roles router
pub fn roles_router(state: RolesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_roles, create_role))
        .routes(routes!(get_role))
        .with_state(state)
}
