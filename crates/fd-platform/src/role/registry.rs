//! Role Registry
//!
//! Create-if-absent registration and lookup of roles.

use std::sync::Arc;

use tracing::info;

use crate::role::entity::UserRole;
use crate::role::repository::RoleStore;
use crate::shared::authorization::{checks, AuthContext};
use crate::shared::error::{PlatformError, Result};

/// Maximum number of roles returned by [`RoleRegistry::list`].
pub const ROLE_LIST_LIMIT: i64 = 20;

pub struct RoleRegistry {
    store: Arc<dyn RoleStore>,
}

impl RoleRegistry {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Register a new role. Requires the admin role.
    pub async fn register(&self, actor: &AuthContext, name: &str) -> Result<UserRole> {
        checks::require_admin(actor)?;
        self.register_unchecked(name).await
    }

    /// Register without an actor, for start-up seeding.
    pub(crate) async fn register_unchecked(&self, name: &str) -> Result<UserRole> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlatformError::validation("Role name is required"));
        }

        if self.store.find_by_name(name).await?.is_some() {
            return Err(PlatformError::duplicate("Role", "role", name));
        }

        let role = UserRole::new(name);
        self.store.insert(&role).await?;

        info!(role_id = %role.id, role = %role.role, "Role registered");
        Ok(role)
    }

    pub async fn get(&self, id: &str) -> Result<UserRole> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Role", id))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<UserRole>> {
        self.store.find_by_name(name).await
    }

    /// First [`ROLE_LIST_LIMIT`] roles.
    pub async fn list(&self) -> Result<Vec<UserRole>> {
        self.store.list(Some(ROLE_LIST_LIMIT)).await
    }
}
