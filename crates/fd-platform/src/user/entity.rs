//! User Entity
//!
//! The persisted user document holds references (ids) to its timezone and
//! roles. Clients only ever see [`UserView`], where those references are
//! replaced by the referenced entities and the password hash is absent.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use utoipa::ToSchema;

use crate::role::entity::RoleResponse;
use crate::shared::ids::IdGenerator;
use crate::timezone::entity::TimezoneResponse;

/// User document (`users` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique user name
    pub user_name: String,

    /// Argon2id hash in PHC format
    pub password: String,

    pub is_active: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,

    /// Timezone id
    pub current_timezone: String,

    /// Role ids, without duplicates
    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    pub fn new(
        user_name: impl Into<String>,
        password_hash: impl Into<String>,
        current_timezone: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: IdGenerator::generate(),
            user_name: user_name.into(),
            password: password_hash.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
            current_timezone: current_timezone.into(),
            roles,
        }
    }
}

/// Mutable fields replaced by an update. Password, creation time and the
/// active flag are never touched; the flag only changes through
/// deactivation.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub user_name: String,
    pub updated_at: DateTime<Utc>,
    pub current_timezone: String,
    pub roles: Vec<String>,
}

/// Denormalized user representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: String,
    pub user_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_timezone: TimezoneResponse,
    pub roles: Vec<RoleResponse>,
}

fn default_true() -> bool {
    true
}

/// Create user request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub user_name: String,

    /// Plaintext password, hashed before storage
    pub password: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Defaults to the time of the request
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Defaults to the time of the request
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Timezone id
    pub current_timezone: String,

    /// Role ids
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Update user request: full replacement of the mutable fields
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    /// Must match the path id when present
    #[serde(default)]
    pub id: Option<String>,

    pub user_name: String,

    /// Must equal the stored flag
    pub is_active: bool,

    /// Accepted and ignored
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Defaults to the time of the request
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    pub current_timezone: String,

    #[serde(default)]
    pub roles: Vec<String>,
}

/// Remove duplicate ids keeping the first occurrence.
pub fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
