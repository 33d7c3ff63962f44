//! Record of every entry point discovered during a fan-out run

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use shared::DiscoveryLogEntry;

use crate::error::HarnessResult;

/// File name of the persisted discovery log inside the run directory
pub const EP_LOG_FILE: &str = "ep-log.csv";

const HEADER: [&str; 3] = ["Site", "URL", "Entry Point"];

/// Append-only, in-memory discovery log shared by all fan-out units
#[derive(Debug, Default)]
pub struct DiscoveryLog {
    entries: Mutex<Vec<DiscoveryLogEntry>>,
}

impl DiscoveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DiscoveryLogEntry>> {
        // A panicking appender cannot leave a half-written entry behind
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, child_id: &str, url: &str, entry_point: &str) {
        self.lock().push(DiscoveryLogEntry {
            child_id: child_id.to_string(),
            url: url.to_string(),
            entry_point: entry_point.to_string(),
        });
    }

    /// Snapshot of the entries in append order
    pub fn entries(&self) -> Vec<DiscoveryLogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Write the log as CSV; the header is written even when there are no entries
    pub fn persist(&self, path: &Path) -> HarnessResult<()> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(HEADER)?;
        for entry in self.lock().iter() {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(())
    }
}
