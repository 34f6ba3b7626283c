//! Start-up seeding

pub mod bootstrap;

pub use bootstrap::{BootstrapSeeder, BootstrapOutcome};
