//! Fidelity Common
//!
//! Infrastructure shared by every Fidelity binary.

pub mod logging;

pub use logging::{init_logging, LogFormat};
