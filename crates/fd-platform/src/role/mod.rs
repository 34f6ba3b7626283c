//! Role Aggregate
//!
//! Registry of named roles attached to users.

pub mod entity;
pub mod repository;
pub mod registry;
pub mod api;

pub use entity::{UserRole, RoleResponse, CreateRoleRequest};
pub use repository::{RoleStore, RoleRepository, InMemoryRoleStore};
pub use registry::{RoleRegistry, ROLE_LIST_LIMIT};
pub use api::{roles_router, RolesState};
