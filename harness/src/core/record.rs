//! Flat telemetry record forwarded to the sink for each task or site outcome

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use shared::{RunInfo, Task};

use crate::error::HarnessError;

/// Column names of the run log
pub mod columns {
    pub const TESTING_RUN: &str = "Testing Run";
    pub const ANALYZER_VERSION: &str = "Analyzer Version";
    pub const SITE: &str = "Site";
    pub const URL: &str = "URL";
    pub const ENTRY_POINT: &str = "Entry Point";
    pub const DISCOVERY_TIME: &str = "Discovery Time";
    pub const RUNNING_TIME: &str = "Running Time";
    pub const EXIT_CODE: &str = "Exit Code";
    pub const ANALYSIS: &str = "Analysis";

    /// Columns owned by the harness; analyzer statistics never replace them
    pub const RESERVED: [&str; 9] = [
        TESTING_RUN,
        ANALYZER_VERSION,
        SITE,
        URL,
        ENTRY_POINT,
        DISCOVERY_TIME,
        RUNNING_TIME,
        EXIT_CODE,
        ANALYSIS,
    ];

    pub fn is_reserved(column: &str) -> bool {
        RESERVED.contains(&column)
    }
}

/// Column name → string value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TelemetryRecord {
    columns: BTreeMap<String, String>,
}

impl TelemetryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base record for one analyzer execution
    pub fn for_task(run: &RunInfo, task: &Task, discovery_time: &str) -> Self {
        let mut record = Self::for_site(run, task, discovery_time);
        record.insert(columns::ENTRY_POINT, task.entry_point.to_string());
        record
    }

    /// Base record for a site-level outcome (no entry point yet)
    pub fn for_site(run: &RunInfo, site: &Task, discovery_time: &str) -> Self {
        let mut record = Self::new();
        record.insert(columns::TESTING_RUN, &run.timestamp);
        record.insert(columns::ANALYZER_VERSION, &run.version);
        record.insert(columns::SITE, &site.id);
        record.insert(columns::URL, &site.url);
        record.insert(columns::DISCOVERY_TIME, discovery_time);
        record
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Mark the record as describing a failure of the harness itself
    pub fn annotate_error(&mut self, error: &HarnessError) {
        self.insert(
            columns::ANALYSIS,
            format!("{} in the test harness: {}", error.kind(), error),
        );
    }
}

/// Render a duration the way the run log has always shown it: `H:MM:SS[.ffffff]`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    let micros = elapsed.subsec_micros();

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days} day{}, ", if days == 1 { "" } else { "s" }));
    }
    out.push_str(&format!("{hours}:{minutes:02}:{seconds:02}"));
    if micros > 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}
