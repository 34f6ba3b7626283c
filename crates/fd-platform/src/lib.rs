//! Fidelity Platform
//!
//! User administration service providing:
//! - Users with a current timezone and a set of roles
//! - Role and timezone registries
//! - Audit trail of role and active-status changes
//! - Password login issuing signed bearer tokens
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities and API bodies
//! - `repository` - Store trait with MongoDB and in-memory implementations
//! - `api` - REST endpoints

// Aggregates
pub mod user;
pub mod role;
pub mod timezone;
pub mod audit;

// Authentication
pub mod auth;

// Shared infrastructure
pub mod shared;

// Start-up and wiring
pub mod seed;
pub mod app;

pub use shared::error::{PlatformError, Result};
pub use shared::authorization::{AuthContext, ADMIN_ROLE, checks};
pub use shared::ids::IdGenerator;
pub use shared::indexes::initialize_indexes;

pub use user::entity::{User, UserView, CreateUserRequest, UpdateUserRequest};
pub use user::service::UserService;
pub use role::entity::{UserRole, RoleResponse};
pub use role::registry::RoleRegistry;
pub use timezone::entity::{Timezone, TimezoneResponse};
pub use timezone::registry::TimezoneRegistry;
pub use audit::entity::{RoleChangeRecord, StatusChangeRecord};

pub use auth::{AuthService, TokenConfig, PasswordService, Argon2Config};
pub use seed::{BootstrapSeeder, BootstrapOutcome};
pub use app::{Platform, Stores};
