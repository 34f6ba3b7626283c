//! Application Assembly
//!
//! Wires stores into services and services into the HTTP router. The
//! server binary uses the MongoDB stores; tests use the in-memory ones.

use std::sync::Arc;

use axum::{http::HeaderValue, Router};
use mongodb::Database;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::audit::repository::{AuditRepository, AuditStore, InMemoryAuditStore};
use crate::auth::auth_api::{auth_router, AuthApiState};
use crate::auth::auth_service::AuthService;
use crate::auth::password_service::PasswordService;
use crate::role::api::{roles_router, RolesState};
use crate::role::registry::RoleRegistry;
use crate::role::repository::{InMemoryRoleStore, RoleRepository, RoleStore};
use crate::seed::bootstrap::BootstrapSeeder;
use crate::shared::health_api::health_router;
use crate::shared::middleware::{AppState, AuthLayer};
use crate::timezone::api::{timezones_router, TimezonesState};
use crate::timezone::registry::TimezoneRegistry;
use crate::timezone::repository::{InMemoryTimezoneStore, TimezoneRepository, TimezoneStore};
use crate::user::api::{users_router, UsersState};
use crate::user::repository::{InMemoryUserStore, UserRepository, UserStore};
use crate::user::service::UserService;

/// Store handles injected into the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub timezones: Arc<dyn TimezoneStore>,
    pub audit: Arc<dyn AuditStore>,
}

impl Stores {
    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(UserRepository::new(db)),
            roles: Arc::new(RoleRepository::new(db)),
            timezones: Arc::new(TimezoneRepository::new(db)),
            audit: Arc::new(AuditRepository::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_audit(Arc::new(InMemoryAuditStore::new()))
    }

    /// In-memory stores around the given audit store
    pub fn with_audit(audit: Arc<dyn AuditStore>) -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            roles: Arc::new(InMemoryRoleStore::new()),
            timezones: Arc::new(InMemoryTimezoneStore::new()),
            audit,
        }
    }
}

/// The assembled platform services
#[derive(Clone)]
pub struct Platform {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub role_registry: Arc<RoleRegistry>,
    pub timezone_registry: Arc<TimezoneRegistry>,
}

impl Platform {
    pub fn new(stores: Stores, auth_service: AuthService, password_service: PasswordService) -> Self {
        let user_service = UserService::new(
            stores.users,
            stores.roles.clone(),
            stores.timezones.clone(),
            stores.audit,
            Arc::new(password_service),
        );

        Self {
            auth_service: Arc::new(auth_service),
            user_service: Arc::new(user_service),
            role_registry: Arc::new(RoleRegistry::new(stores.roles)),
            timezone_registry: Arc::new(TimezoneRegistry::new(stores.timezones)),
        }
    }

    pub fn bootstrap_seeder(&self) -> BootstrapSeeder {
        BootstrapSeeder::new(
            self.user_service.clone(),
            self.role_registry.clone(),
            self.timezone_registry.clone(),
        )
    }

    /// Build the HTTP application.
    ///
    /// An empty `cors_origins` allows any origin.
    pub fn router(&self, cors_origins: &[String]) -> Router {
        let app_state = AppState {
            auth_service: self.auth_service.clone(),
            user_service: self.user_service.clone(),
        };

        let (router, mut openapi) = OpenApiRouter::new()
            .merge(health_router())
            .nest("/v1", auth_router(AuthApiState {
                auth_service: self.auth_service.clone(),
                user_service: self.user_service.clone(),
            }))
            .nest("/v1/users", users_router(UsersState {
                user_service: self.user_service.clone(),
            }))
            .nest("/v1/user_roles", roles_router(RolesState {
                registry: self.role_registry.clone(),
            }))
            .nest("/v1/timezones", timezones_router(TimezonesState {
                registry: self.timezone_registry.clone(),
            }))
            .split_for_parts();

        openapi.info.title = "Fidelity API".to_string();
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
        openapi.info.description = Some("User, role and timezone administration".to_string());
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }

        Router::new()
            .merge(router)
            .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi))
            .layer(AuthLayer::new(app_state))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(cors_origins))
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
