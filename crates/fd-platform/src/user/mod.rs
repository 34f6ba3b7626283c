//! User Aggregate
//!
//! Users, their denormalized views, and the mutations that keep the role
//! and status audit trail.

pub mod entity;
pub mod repository;
pub mod service;
pub mod api;

pub use entity::{User, UserUpdate, UserView, CreateUserRequest, UpdateUserRequest};
pub use repository::{UserStore, UserRepository, InMemoryUserStore};
pub use service::UserService;
pub use api::{users_router, UsersState};
