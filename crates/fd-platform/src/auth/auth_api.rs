//! Authentication API
//!
//! - `POST /login` form login issuing a bearer token
//! - `GET /me` the authenticated user's view

use axum::{
    extract::State,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::auth_service::AuthService;
use crate::shared::error::{PlatformError, ErrorResponse};
use crate::shared::middleware::Authenticated;
use crate::user::entity::UserView;
use crate::user::service::UserService;

/// Login form (`application/x-www-form-urlencoded`)
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
    pub user_name: String,
    pub id: String,
    pub is_admin: bool,
}

/// Auth API state
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
}

/// Exchange user name and password for an access token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postV1Login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or inactive user", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, PlatformError> {
    let user = state.user_service
        .verify_credentials(&form.username, &form.password)
        .await?;

    let context = state.user_service.context_for(&user).await?;
    let access_token = state.auth_service.generate_access_token(&user.user_name)?;

    info!(user_id = %user.id, user_name = %user.user_name, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_name: user.user_name,
        id: user.id,
        is_admin: context.is_admin(),
    }))
}

/// Current user
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    operation_id = "getV1Me",
    responses(
        (status = 200, description = "Authenticated user", body = UserView),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AuthApiState>,
    auth: Authenticated,
) -> Result<Json<UserView>, PlatformError> {
    Ok(Json(state.user_service.resolve(&auth.user_id).await?))
}

pub fn auth_router(state: AuthApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(me))
        .with_state(state)
}
