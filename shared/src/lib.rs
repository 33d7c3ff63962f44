//! Shared types for the concolic real-site harness
//!
//! Contains the task/run data model, the shared error type and the
//! tracing setup used by every harness component.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
