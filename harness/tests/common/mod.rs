//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across all harness test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::HarnessBuilder;
// Only some test binaries use the helpers
#[allow(unused_imports)]
pub use helpers::TestHelpers;
