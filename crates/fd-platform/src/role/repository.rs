//! Role Repository

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};
use tokio::sync::RwLock;

use crate::role::entity::UserRole;
use crate::shared::error::{is_duplicate_key_error, PlatformError, Result};

/// Persistence for the role registry
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Insert a role. A name collision yields `Duplicate`.
    async fn insert(&self, role: &UserRole) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRole>>;

    async fn find_by_name(&self, role: &str) -> Result<Option<UserRole>>;

    /// Roles whose id is in `ids`. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<UserRole>>;

    /// Roles in insertion order, at most `limit` when given.
    async fn list(&self, limit: Option<i64>) -> Result<Vec<UserRole>>;
}

pub struct RoleRepository {
    collection: Collection<UserRole>,
}

impl RoleRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("user_roles"),
        }
    }
}

#[async_trait]
impl RoleStore for RoleRepository {
    async fn insert(&self, role: &UserRole) -> Result<()> {
        match self.collection.insert_one(role).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(PlatformError::duplicate("Role", "role", &role.role))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRole>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_name(&self, role: &str) -> Result<Option<UserRole>> {
        Ok(self.collection.find_one(doc! { "role": role }).await?)
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<UserRole>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self.collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<UserRole>> {
        let mut find = self.collection.find(doc! {}).sort(doc! { "_id": 1 });
        if let Some(limit) = limit {
            find = find.limit(limit);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }
}

/// In-memory implementation for testing
#[derive(Clone, Default)]
pub struct InMemoryRoleStore {
    roles: Arc<RwLock<Vec<UserRole>>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn insert(&self, role: &UserRole) -> Result<()> {
        let mut roles = self.roles.write().await;
        if roles.iter().any(|r| r.role == role.role) {
            return Err(PlatformError::duplicate("Role", "role", &role.role));
        }
        roles.push(role.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRole>> {
        Ok(self.roles.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_name(&self, role: &str) -> Result<Option<UserRole>> {
        Ok(self.roles.read().await.iter().find(|r| r.role == role).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<UserRole>> {
        Ok(self.roles
            .read()
            .await
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<UserRole>> {
        let roles = self.roles.read().await;
        let take = limit.map(|l| l.max(0) as usize).unwrap_or(roles.len());
        Ok(roles.iter().take(take).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_rejects_duplicate_name() {
        let store = InMemoryRoleStore::new();
        store.insert(&UserRole::new("admin")).await.unwrap();

        let err = store.insert(&UserRole::new("admin")).await.unwrap_err();
        assert!(matches!(err, PlatformError::Duplicate { .. }));
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_find_by_ids_skips_unknown() {
        let store = InMemoryRoleStore::new();
        let admin = UserRole::new("admin");
        let viewer = UserRole::new("viewer");
        store.insert(&admin).await.unwrap();
        store.insert(&viewer).await.unwrap();

        let found = store
            .find_by_ids(&[admin.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found, vec![admin]);
    }

    #[tokio::test]
    async fn test_in_memory_list_limit_keeps_insertion_order() {
        let store = InMemoryRoleStore::new();
        for i in 0..5 {
            store.insert(&UserRole::new(format!("role-{}", i))).await.unwrap();
        }

        let names: Vec<String> = store
            .list(Some(3))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.role)
            .collect();
        assert_eq!(names, vec!["role-0", "role-1", "role-2"]);
    }
}
