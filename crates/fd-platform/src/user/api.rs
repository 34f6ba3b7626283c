//! Users API
//!
//! REST endpoints for user management and user audit history.

use axum::{
    extract::{State, Path},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use std::sync::Arc;

use crate::audit::entity::{RoleChangeResponse, StatusChangeResponse};
use crate::shared::error::{PlatformError, ErrorResponse};
use crate::shared::middleware::Authenticated;
use crate::user::entity::{CreateUserRequest, UpdateUserRequest, UserView};
use crate::user::service::UserService;

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub user_service: Arc<UserService>,
}

/// List all users
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    operation_id = "getV1Users",
    responses(
        (status = 200, description = "List of users", body = Vec<UserView>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<UsersState>,
    _auth: Authenticated,
) -> Result<Json<Vec<UserView>>, PlatformError> {
    Ok(Json(state.user_service.resolve_all().await?))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = "users",
    operation_id = "postV1Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Referenced timezone or role not found", body = ErrorResponse),
        (status = 409, description = "User name already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), PlatformError> {
    let view = state.user_service.create(&auth.0, req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "users",
    operation_id = "getV1UsersById",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<UsersState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<UserView>, PlatformError> {
    Ok(Json(state.user_service.resolve(&id).await?))
}

/// Replace a user's mutable fields
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "users",
    operation_id = "putV1UsersById",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 400, description = "Invalid request or audit write failed", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User or reference not found", body = ErrorResponse),
        (status = 409, description = "User name already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, PlatformError> {
    Ok(Json(state.user_service.update(&auth.0, &id, req).await?))
}

/// Deactivate a user
///
/// Users are never removed; this sets `is_active` to false.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "users",
    operation_id = "deleteV1UsersById",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deactivated", body = UserView),
        (status = 400, description = "User is already inactive", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<UserView>, PlatformError> {
    Ok(Json(state.user_service.deactivate(&auth.0, &id).await?))
}

/// Role change history of a user, newest first
#[utoipa::path(
    get,
    path = "/{id}/role-history",
    tag = "users",
    operation_id = "getV1UsersByIdRoleHistory",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Role changes", body = Vec<RoleChangeResponse>),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_role_history(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<RoleChangeResponse>>, PlatformError> {
    let records = state.user_service.role_history(&auth.0, &id).await?;
    Ok(Json(records.into_iter().map(RoleChangeResponse::from).collect()))
}

/// Status change history of a user, newest first
#[utoipa::path(
    get,
    path = "/{id}/status-history",
    tag = "users",
    operation_id = "getV1UsersByIdStatusHistory",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Status changes", body = Vec<StatusChangeResponse>),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_status_history(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<StatusChangeResponse>>, PlatformError> {
    let records = state.user_service.status_history(&auth.0, &id).await?;
    Ok(Json(records.into_iter().map(StatusChangeResponse::from).collect()))
}

/// Create the users router
pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_user, update_user, delete_user))
        .routes(routes!(get_role_history))
        .routes(routes!(get_status_history))
        .with_state(state)
}
