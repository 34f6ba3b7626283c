//! Timezone Registry

use std::sync::Arc;

use tracing::info;

use crate::shared::authorization::{checks, AuthContext};
use crate::shared::error::{PlatformError, Result};
use crate::timezone::entity::Timezone;
use crate::timezone::repository::TimezoneStore;

pub struct TimezoneRegistry {
    store: Arc<dyn TimezoneStore>,
}

impl TimezoneRegistry {
    pub fn new(store: Arc<dyn TimezoneStore>) -> Self {
        Self { store }
    }

    /// Register a new timezone. Requires the admin role.
    pub async fn register(&self, actor: &AuthContext, name: &str) -> Result<Timezone> {
        checks::require_admin(actor)?;
        self.register_unchecked(name).await
    }

    pub(crate) async fn register_unchecked(&self, name: &str) -> Result<Timezone> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlatformError::validation("Timezone name is required"));
        }

        if self.store.find_by_name(name).await?.is_some() {
            return Err(PlatformError::duplicate("Timezone", "timezone", name));
        }

        let timezone = Timezone::new(name);
        self.store.insert(&timezone).await?;

        info!(timezone_id = %timezone.id, timezone = %timezone.timezone, "Timezone registered");
        Ok(timezone)
    }

    pub async fn get(&self, id: &str) -> Result<Timezone> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Timezone", id))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Timezone>> {
        self.store.find_by_name(name).await
    }

    pub async fn list(&self) -> Result<Vec<Timezone>> {
        self.store.list().await
    }
}
