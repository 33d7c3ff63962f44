//! Real-site regression harness for a concolic web analyzer
//!
//! This library turns a descriptor file of sites into a suite of test units.
//! Each unit runs the external analyzer once, collects its artifacts into a
//! per-run directory and records one telemetry row. In fan-out mode each site
//! first goes through an entry-point discovery tool and one child unit runs
//! per discovered entry point.

pub mod config;
pub mod core;
pub mod error;
pub mod run;
pub mod services;
pub mod site_harness;
pub mod suite;
pub mod traits;

// Re-export commonly used types
pub use config::HarnessConfig;
pub use core::{DiscoveryLog, TelemetryRecord, TestUnit};
pub use error::{ChildFailure, ErrorKind, HarnessError, HarnessResult};
pub use site_harness::{HarnessSettings, SiteHarness};
pub use suite::{Suite, SuiteMode, SuiteSummary};
pub use traits::{Analyzer, Debugger, EntryPointFinder, TelemetrySink};
