//! Timezone Entity

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::ids::IdGenerator;

/// A timezone users can be placed in, typically an IANA zone name.
///
/// Stored in the `timezones` collection. The name is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timezone {
    #[serde(rename = "_id")]
    pub id: String,

    pub timezone: String,
}

impl Timezone {
    pub fn new(timezone: impl Into<String>) -> Self {
        Self {
            id: IdGenerator::generate(),
            timezone: timezone.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimezoneResponse {
    pub id: String,
    pub timezone: String,
}

impl From<Timezone> for TimezoneResponse {
    fn from(t: Timezone) -> Self {
        Self {
            id: t.id,
            timezone: t.timezone,
        }
    }
}

/// Create timezone request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTimezoneRequest {
    /// Timezone name (e.g. "Europe/Paris"), unique
    pub timezone: String,
}
