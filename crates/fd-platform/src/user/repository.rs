//! User Repository

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::{doc, DateTime as BsonDateTime}};
use tokio::sync::RwLock;

use crate::shared::error::{is_duplicate_key_error, PlatformError, Result};
use crate::user::entity::{User, UserUpdate};

/// Persistence for users
///
/// Write operations report how many documents matched so callers can tell
/// a vanished user from a successful write.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A user name collision yields `Duplicate`.
    async fn insert(&self, user: &User) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>>;

    /// All users in insertion order
    async fn find_all(&self) -> Result<Vec<User>>;

    async fn count(&self) -> Result<u64>;

    /// Replace the mutable fields of a user. Returns the matched count.
    async fn update(&self, id: &str, update: &UserUpdate) -> Result<u64>;

    /// Set the active flag. Returns the matched count.
    async fn set_active(&self, id: &str, is_active: bool) -> Result<u64>;
}

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        match self.collection.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(PlatformError::duplicate("User", "user_name", &user.user_name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "user_name": user_name }).await?)
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn update(&self, id: &str, update: &UserUpdate) -> Result<u64> {
        let result = self.collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "user_name": &update.user_name,
                    "updated_at": BsonDateTime::from_chrono(update.updated_at),
                    "current_timezone": &update.current_timezone,
                    "roles": update.roles.clone(),
                }},
            )
            .await;

        match result {
            Ok(r) => Ok(r.matched_count),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(PlatformError::duplicate("User", "user_name", &update.user_name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_active(&self, id: &str, is_active: bool) -> Result<u64> {
        let result = self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "is_active": is_active } })
            .await?;
        Ok(result.matched_count)
    }
}

/// In-memory implementation for testing
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document as-is, bypassing uniqueness checks. Lets tests
    /// plant inconsistent data such as dangling references.
    pub async fn put_raw(&self, user: User) {
        self.users.write().await.push(user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.user_name == user.user_name) {
            return Err(PlatformError::duplicate("User", "user_name", &user.user_name));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.user_name == user_name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn update(&self, id: &str, update: &UserUpdate) -> Result<u64> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id != id && u.user_name == update.user_name) {
            return Err(PlatformError::duplicate("User", "user_name", &update.user_name));
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(0);
        };
        user.user_name = update.user_name.clone();
        user.updated_at = update.updated_at;
        user.current_timezone = update.current_timezone.clone();
        user.roles = update.roles.clone();
        Ok(1)
    }

    async fn set_active(&self, id: &str, is_active: bool) -> Result<u64> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_active = is_active;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
