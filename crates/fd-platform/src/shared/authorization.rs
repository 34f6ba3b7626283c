//! Authorization
//!
//! Role-name based access control. A user holding the role named
//! [`ADMIN_ROLE`] may mutate users and registries; every other
//! authenticated user is read-only.

/// The role name that grants administrative privileges.
pub const ADMIN_ROLE: &str = "admin";

/// Authorization context for a request
///
/// Built per request from the store, never from token contents, so role
/// changes and deactivation take effect on the next request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Acting user ID
    pub user_id: String,

    /// Acting user name
    pub user_name: String,

    /// Names of the roles the user holds
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            roles,
        }
    }

    /// Check if this context has a role by exact name
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Authorization checks for handlers and services
pub mod checks {
    use super::*;
    use crate::shared::error::{PlatformError, Result};

    /// Require the admin role
    pub fn require_admin(context: &AuthContext) -> Result<()> {
        if context.is_admin() {
            Ok(())
        } else {
            Err(PlatformError::forbidden("Admin role required"))
        }
    }
}
