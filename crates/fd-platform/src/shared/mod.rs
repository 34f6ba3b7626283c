//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod error;
pub mod ids;
pub mod authorization;
pub mod middleware;
pub mod indexes;
pub mod health_api;

// Re-export commonly used items
pub use error::{PlatformError, Result, ErrorResponse};
pub use ids::IdGenerator;
pub use authorization::{AuthContext, ADMIN_ROLE, checks};
pub use middleware::{Authenticated, AppState, AuthLayer};
pub use health_api::health_router;
