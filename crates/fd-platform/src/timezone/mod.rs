//! Timezone Aggregate

pub mod entity;
pub mod repository;
pub mod registry;
pub mod api;

pub use entity::{Timezone, TimezoneResponse, CreateTimezoneRequest};
pub use repository::{TimezoneStore, TimezoneRepository, InMemoryTimezoneStore};
pub use registry::TimezoneRegistry;
pub use api::{timezones_router, TimezonesState};
