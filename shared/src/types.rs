//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Token in the descriptor file that asks the analyzer to pick its own entry points
pub const AUTO_ENTRY_POINT: &str = "auto";

/// Pipeline stage emitting a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Suite driver (registration, summary, persistence)
    Suite,
    /// Single test unit execution
    Unit,
    /// Entry-point discovery and child aggregation
    FanOut,
    /// Post-crash backtrace capture
    Forensics,
    /// Telemetry record delivery
    Telemetry,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Suite => write!(f, "suite"),
            Stage::Unit => write!(f, "unit"),
            Stage::FanOut => write!(f, "fan_out"),
            Stage::Forensics => write!(f, "forensics"),
            Stage::Telemetry => write!(f, "telemetry"),
        }
    }
}

/// How the analyzer should choose the entry point for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryPointSpec {
    /// Let the analyzer use its built-in entry points
    Auto,
    /// Locator (usually an XPath expression) given in the descriptor file
    Explicit(String),
    /// Locator returned by the discovery tool
    Discovered(String),
}

impl EntryPointSpec {
    /// Parse the third descriptor column
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(AUTO_ENTRY_POINT) {
            EntryPointSpec::Auto
        } else {
            EntryPointSpec::Explicit(raw.to_string())
        }
    }

    /// Locator to pass to the analyzer, `None` when it should pick its own
    pub fn override_locator(&self) -> Option<&str> {
        match self {
            EntryPointSpec::Auto => None,
            EntryPointSpec::Explicit(locator) if locator.eq_ignore_ascii_case(AUTO_ENTRY_POINT) => None,
            EntryPointSpec::Explicit(locator) | EntryPointSpec::Discovered(locator) => Some(locator.as_str()),
        }
    }
}

impl fmt::Display for EntryPointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPointSpec::Auto => write!(f, "{AUTO_ENTRY_POINT}"),
            EntryPointSpec::Explicit(locator) | EntryPointSpec::Discovered(locator) => write!(f, "{locator}"),
        }
    }
}

/// One analyzer execution to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub url: String,
    pub entry_point: EntryPointSpec,
}

impl Task {
    pub fn new(id: impl Into<String>, url: impl Into<String>, entry_point: EntryPointSpec) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            entry_point,
        }
    }

    /// Child task for the `index`-th (1-based) discovered entry point of this site
    pub fn child(&self, index: usize, locator: impl Into<String>) -> Self {
        Self {
            id: child_id(&self.id, index),
            url: self.url.clone(),
            entry_point: EntryPointSpec::Discovered(locator.into()),
        }
    }
}

/// Deterministic id of a fan-out child: `{parent}_{index}`
pub fn child_id(parent: &str, index: usize) -> String {
    format!("{parent}_{index}")
}

/// Metadata for one batch invocation of the harness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Local start time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    /// Version label of the analyzer under test
    pub version: String,
    /// Directory holding every task's artifacts for this run
    pub output_dir: PathBuf,
}

/// Result of one analyzer execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionReport {
    pub return_code: i32,
    pub elapsed: Duration,
    /// Namespaced statistics printed by the analyzer (`Concolic::...`, `Ajax::...`)
    pub metrics: BTreeMap<String, String>,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        self.return_code == 0
    }
}

/// Row of the discovery log written at the end of a fan-out run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryLogEntry {
    #[serde(rename = "Site")]
    pub child_id: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Entry Point")]
    pub entry_point: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_parse_is_case_insensitive_for_auto() {
        assert_eq!(EntryPointSpec::parse("auto"), EntryPointSpec::Auto);
        assert_eq!(EntryPointSpec::parse("AUTO"), EntryPointSpec::Auto);
        assert_eq!(EntryPointSpec::parse(" Auto "), EntryPointSpec::Auto);
        assert_eq!(
            EntryPointSpec::parse("//button[@id='go']"),
            EntryPointSpec::Explicit("//button[@id='go']".to_string())
        );
    }

    #[test]
    fn test_override_locator() {
        assert_eq!(EntryPointSpec::Auto.override_locator(), None);
        assert_eq!(EntryPointSpec::Explicit("//a".into()).override_locator(), Some("//a"));
        assert_eq!(EntryPointSpec::Discovered("//b".into()).override_locator(), Some("//b"));
    }

    #[test]
    fn test_child_ids_are_one_based() {
        let site = Task::new("shop", "http://shop.example", EntryPointSpec::Auto);
        let child = site.child(1, "//button");

        assert_eq!(child.id, "shop_1");
        assert_eq!(child.url, site.url);
        assert_eq!(child.entry_point, EntryPointSpec::Discovered("//button".into()));
        assert_eq!(child_id("shop", 12), "shop_12");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::FanOut.to_string(), "fan_out");
        assert_eq!(Stage::Suite.to_string(), "suite");
    }
}
