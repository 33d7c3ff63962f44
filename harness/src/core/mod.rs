//! Core harness logic: catalog, telemetry records, test units and fan-out

pub mod catalog;
pub mod discovery_log;
pub mod fan_out;
pub mod forensics;
pub mod metrics;
pub mod record;
pub mod unit;

pub use catalog::{load_tasks, parse_tasks};
pub use discovery_log::{DiscoveryLog, EP_LOG_FILE};
pub use fan_out::{child_id_collisions, DRY_RUN_ENTRY_POINT, NO_ENTRY_POINTS};
pub use metrics::{extract_columns, report_metrics};
pub use record::{columns, format_elapsed, TelemetryRecord};
pub use unit::{unit_name, TestUnit};
