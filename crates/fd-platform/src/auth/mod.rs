//! Authentication Module

pub mod auth_service;
pub mod password_service;
pub mod auth_api;

pub use auth_service::{AuthService, TokenConfig, AccessTokenClaims, extract_bearer_token};
pub use password_service::{PasswordService, Argon2Config};
pub use auth_api::{auth_router, AuthApiState, LoginForm, LoginResponse};
