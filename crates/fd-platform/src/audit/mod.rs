//! Audit Aggregate
//!
//! Append-only role and status change records. Records are written by the
//! user service and read through the users API.

pub mod entity;
pub mod repository;

pub use entity::{RoleChangeRecord, StatusChangeRecord, RoleChangeResponse, StatusChangeResponse};
pub use repository::{AuditStore, AuditRepository, InMemoryAuditStore};
