//! Timezone Repository

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};
use tokio::sync::RwLock;

use crate::shared::error::{is_duplicate_key_error, PlatformError, Result};
use crate::timezone::entity::Timezone;

/// Persistence for the timezone registry
#[async_trait]
pub trait TimezoneStore: Send + Sync {
    /// Insert a timezone. A name collision yields `Duplicate`.
    async fn insert(&self, timezone: &Timezone) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Timezone>>;

    async fn find_by_name(&self, timezone: &str) -> Result<Option<Timezone>>;

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Timezone>>;

    async fn list(&self) -> Result<Vec<Timezone>>;
}

pub struct TimezoneRepository {
    collection: Collection<Timezone>,
}

impl TimezoneRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("timezones"),
        }
    }
}

#[async_trait]
impl TimezoneStore for TimezoneRepository {
    async fn insert(&self, timezone: &Timezone) -> Result<()> {
        match self.collection.insert_one(timezone).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(PlatformError::duplicate("Timezone", "timezone", &timezone.timezone))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Timezone>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_name(&self, timezone: &str) -> Result<Option<Timezone>> {
        Ok(self.collection.find_one(doc! { "timezone": timezone }).await?)
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Timezone>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self.collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list(&self) -> Result<Vec<Timezone>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

/// In-memory implementation for testing
#[derive(Clone, Default)]
pub struct InMemoryTimezoneStore {
    timezones: Arc<RwLock<Vec<Timezone>>>,
}

impl InMemoryTimezoneStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimezoneStore for InMemoryTimezoneStore {
    async fn insert(&self, timezone: &Timezone) -> Result<()> {
        let mut timezones = self.timezones.write().await;
        if timezones.iter().any(|t| t.timezone == timezone.timezone) {
            return Err(PlatformError::duplicate("Timezone", "timezone", &timezone.timezone));
        }
        timezones.push(timezone.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Timezone>> {
        Ok(self.timezones.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_name(&self, timezone: &str) -> Result<Option<Timezone>> {
        Ok(self.timezones.read().await.iter().find(|t| t.timezone == timezone).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Timezone>> {
        Ok(self.timezones
            .read()
            .await
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Timezone>> {
        Ok(self.timezones.read().await.clone())
    }
}
