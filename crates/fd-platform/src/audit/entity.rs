//! Audit Record Entities
//!
//! Immutable records of user role and status transitions. Records are only
//! ever appended; nothing updates or deletes them.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use utoipa::ToSchema;

use crate::shared::ids::IdGenerator;

/// A change of a user's role set (`user_role_history` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleChangeRecord {
    #[serde(rename = "_id")]
    pub id: String,

    /// Subject user
    pub user_id: String,

    /// Role ids held before the change
    pub previous_roles: Vec<String>,

    /// Role ids requested by the change
    pub new_roles: Vec<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub changed_at: DateTime<Utc>,

    /// Acting user
    pub changed_by: String,
}

impl RoleChangeRecord {
    pub fn new(
        user_id: impl Into<String>,
        previous_roles: Vec<String>,
        new_roles: Vec<String>,
        changed_by: impl Into<String>,
    ) -> Self {
        Self {
            id: IdGenerator::generate(),
            user_id: user_id.into(),
            previous_roles,
            new_roles,
            changed_at: Utc::now(),
            changed_by: changed_by.into(),
        }
    }
}

/// A change of a user's active flag (`user_active_history` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    #[serde(rename = "_id")]
    pub id: String,

    pub user_id: String,

    /// Resulting status
    pub is_active: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub changed_at: DateTime<Utc>,

    pub changed_by: String,
}

impl StatusChangeRecord {
    pub fn new(user_id: impl Into<String>, is_active: bool, changed_by: impl Into<String>) -> Self {
        Self {
            id: IdGenerator::generate(),
            user_id: user_id.into(),
            is_active,
            changed_at: Utc::now(),
            changed_by: changed_by.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleChangeResponse {
    pub id: String,
    pub user_id: String,
    pub previous_roles: Vec<String>,
    pub new_roles: Vec<String>,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

impl From<RoleChangeRecord> for RoleChangeResponse {
    fn from(r: RoleChangeRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            previous_roles: r.previous_roles,
            new_roles: r.new_roles,
            changed_at: r.changed_at,
            changed_by: r.changed_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeResponse {
    pub id: String,
    pub user_id: String,
    pub is_active: bool,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

impl From<StatusChangeRecord> for StatusChangeResponse {
    fn from(r: StatusChangeRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            is_active: r.is_active,
            changed_at: r.changed_at,
            changed_by: r.changed_by,
        }
    }
}
