//! Bootstrap Seeder
//!
//! Creates the first administrator on an empty user collection. User
//! creation requires an admin, so a fresh deployment needs one seeded.

use std::sync::Arc;

use tracing::info;

use fd_config::BootstrapConfig;

use crate::role::registry::RoleRegistry;
use crate::shared::authorization::ADMIN_ROLE;
use crate::shared::error::Result;
use crate::timezone::registry::TimezoneRegistry;
use crate::user::entity::CreateUserRequest;
use crate::user::service::UserService;

/// Outcome of a bootstrap run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No admin credentials configured
    NotConfigured,
    /// Users already exist; nothing was touched
    AlreadyInitialized,
    /// Admin user created with this id
    Created(String),
}

pub struct BootstrapSeeder {
    users: Arc<UserService>,
    roles: Arc<RoleRegistry>,
    timezones: Arc<TimezoneRegistry>,
}

impl BootstrapSeeder {
    pub fn new(
        users: Arc<UserService>,
        roles: Arc<RoleRegistry>,
        timezones: Arc<TimezoneRegistry>,
    ) -> Self {
        Self { users, roles, timezones }
    }

    pub async fn seed(&self, config: &BootstrapConfig) -> Result<BootstrapOutcome> {
        let Some((user_name, password)) = config.admin_credentials() else {
            return Ok(BootstrapOutcome::NotConfigured);
        };

        if self.users.has_users().await? {
            return Ok(BootstrapOutcome::AlreadyInitialized);
        }

        let role = match self.roles.find_by_name(ADMIN_ROLE).await? {
            Some(role) => role,
            None => self.roles.register_unchecked(ADMIN_ROLE).await?,
        };

        let timezone_name = config.timezone.trim();
        let timezone = match self.timezones.find_by_name(timezone_name).await? {
            Some(tz) => tz,
            None => self.timezones.register_unchecked(timezone_name).await?,
        };

        let user = self.users
            .insert_user(CreateUserRequest {
                user_name: user_name.to_string(),
                password: password.to_string(),
                is_active: true,
                created_at: None,
                updated_at: None,
                current_timezone: timezone.id,
                roles: vec![role.id],
            })
            .await?;

        info!(user_id = %user.id, user_name = %user.user_name, "Bootstrap admin created");
        Ok(BootstrapOutcome::Created(user.id))
    }
}
