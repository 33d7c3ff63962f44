//! Service implementations
//!
//! Real implementations of the harness traits. These are the production
//! implementations that spawn processes and talk to the network.

pub mod analyzer;
pub mod debugger;
pub mod diagnostics_log;
pub mod entry_point_finder;
pub mod telemetry;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use analyzer::RealAnalyzer;
pub use debugger::GdbDebugger;
pub use diagnostics_log::{DiagnosticsGuard, DiagnosticsLog};
pub use entry_point_finder::RealEntryPointFinder;
pub use telemetry::HttpTelemetrySink;
