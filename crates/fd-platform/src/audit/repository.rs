//! Audit Repository
//!
//! Append-only storage for role and status change records.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};
use tokio::sync::RwLock;

use crate::audit::entity::{RoleChangeRecord, StatusChangeRecord};
use crate::shared::error::{PlatformError, Result};

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record_role_change(&self, record: &RoleChangeRecord) -> Result<()>;

    async fn record_status_change(&self, record: &StatusChangeRecord) -> Result<()>;

    /// Role changes for a user, newest first.
    async fn role_changes_for(&self, user_id: &str) -> Result<Vec<RoleChangeRecord>>;

    /// Status changes for a user, newest first.
    async fn status_changes_for(&self, user_id: &str) -> Result<Vec<StatusChangeRecord>>;
}

pub struct AuditRepository {
    role_changes: Collection<RoleChangeRecord>,
    status_changes: Collection<StatusChangeRecord>,
}

impl AuditRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            role_changes: db.collection("user_role_history"),
            status_changes: db.collection("user_active_history"),
        }
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn record_role_change(&self, record: &RoleChangeRecord) -> Result<()> {
        self.role_changes.insert_one(record).await?;
        Ok(())
    }

    async fn record_status_change(&self, record: &StatusChangeRecord) -> Result<()> {
        self.status_changes.insert_one(record).await?;
        Ok(())
    }

    async fn role_changes_for(&self, user_id: &str) -> Result<Vec<RoleChangeRecord>> {
        let cursor = self.role_changes
            .find(doc! { "user_id": user_id })
            .sort(doc! { "changed_at": -1, "_id": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn status_changes_for(&self, user_id: &str) -> Result<Vec<StatusChangeRecord>> {
        let cursor = self.status_changes
            .find(doc! { "user_id": user_id })
            .sort(doc! { "changed_at": -1, "_id": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

/// In-memory implementation for testing
///
/// Writes can be made to fail with [`InMemoryAuditStore::set_fail_writes`].
#[derive(Clone, Default)]
pub struct InMemoryAuditStore {
    role_changes: Arc<RwLock<Vec<RoleChangeRecord>>>,
    status_changes: Arc<RwLock<Vec<StatusChangeRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn role_change_count(&self) -> usize {
        self.role_changes.read().await.len()
    }

    pub async fn status_change_count(&self) -> usize {
        self.status_changes.read().await.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(PlatformError::internal("audit store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn record_role_change(&self, record: &RoleChangeRecord) -> Result<()> {
        self.check_writable()?;
        self.role_changes.write().await.push(record.clone());
        Ok(())
    }

    async fn record_status_change(&self, record: &StatusChangeRecord) -> Result<()> {
        self.check_writable()?;
        self.status_changes.write().await.push(record.clone());
        Ok(())
    }

    async fn role_changes_for(&self, user_id: &str) -> Result<Vec<RoleChangeRecord>> {
        Ok(self.role_changes
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn status_changes_for(&self, user_id: &str) -> Result<Vec<StatusChangeRecord>> {
        Ok(self.status_changes
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
