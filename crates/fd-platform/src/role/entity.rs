//! Role Entity

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::ids::IdGenerator;

/// A named role that may be attached to users.
///
/// Stored in the `user_roles` collection. The name is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    #[serde(rename = "_id")]
    pub id: String,

    pub role: String,
}

impl UserRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            id: IdGenerator::generate(),
            role: role.into(),
        }
    }
}

/// Role as returned by the API and embedded in user views
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub id: String,
    pub role: String,
}

impl From<UserRole> for RoleResponse {
    fn from(r: UserRole) -> Self {
        Self { id: r.id, role: r.role }
    }
}

impl From<&UserRole> for RoleResponse {
    fn from(r: &UserRole) -> Self {
        Self {
            id: r.id.clone(),
            role: r.role.clone(),
        }
    }
}

/// Create role request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    /// Role name, unique
    pub role: String,
}
