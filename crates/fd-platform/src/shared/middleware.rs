//! API Middleware
//!
//! Bearer token authentication for Axum. The token only proves the user
//! name; roles and the active flag are read from the store per request.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::auth::auth_service::{extract_bearer_token, AuthService};
use crate::shared::authorization::AuthContext;
use crate::shared::error::PlatformError;
use crate::user::service::UserService;

/// Services the extractor needs
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
}

/// The acting user, resolved from the bearer token. Handlers that take
/// this argument reject anonymous requests with 401.
pub struct Authenticated(pub AuthContext);

impl std::ops::Deref for Authenticated {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>()
            .cloned()
            .ok_or_else(|| PlatformError::internal("Auth service not configured"))?;

        let token = parts.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| PlatformError::unauthorized("Missing authentication token"))?;

        let claims = app_state.auth_service.validate_token(token)?;

        let context = app_state.user_service.auth_context(&claims.user_name).await?;

        Ok(Authenticated(context))
    }
}

/// Puts [`AppState`] into every request's extensions for [`Authenticated`]
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());

        let future = self.inner.call(req);
        Box::pin(future)
    }
}
