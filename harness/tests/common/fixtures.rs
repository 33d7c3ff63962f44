//! Test fixtures and data for harness tests
//!
//! This module provides consistent test data used across all test suites.

use std::collections::BTreeMap;
use std::path::Path;

use harness::traits::AnalyzerOutput;
use shared::{EntryPointSpec, RunInfo, Task};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Standard sites
    pub const SHOP_ID: &'static str = "shop";
    pub const SHOP_URL: &'static str = "http://shop.example/";
    pub const NEWS_ID: &'static str = "news";
    pub const NEWS_URL: &'static str = "http://news.example/";

    /// Run metadata
    pub const RUN_TIMESTAMP: &'static str = "2024-03-01 10:00:00";
    pub const ANALYZER_VERSION: &'static str = "abc1234";
    pub const ANALYZER_EXEC: &'static str = "/opt/artemis/artemis";

    /// Content left in the diagnostics log by an earlier run
    pub const STALE_DIAGNOSTICS: &'static str = "stale output from another run\n";

    /// Content the analyzer stand-in writes to the diagnostics log
    pub const RUN_DIAGNOSTICS: &'static str = "(assert (= input \"go\"))\n";

    pub fn run_info(output_dir: &Path) -> RunInfo {
        RunInfo {
            timestamp: Self::RUN_TIMESTAMP.to_string(),
            version: Self::ANALYZER_VERSION.to_string(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn shop_task() -> Task {
        Task::new(Self::SHOP_ID, Self::SHOP_URL, EntryPointSpec::Explicit("//button[@id='buy']".to_string()))
    }

    pub fn news_task() -> Task {
        Task::new(Self::NEWS_ID, Self::NEWS_URL, EntryPointSpec::Auto)
    }

    /// Discovery-mode site (entry point column is ignored)
    pub fn shop_site() -> Task {
        Task::new(Self::SHOP_ID, Self::SHOP_URL, EntryPointSpec::Auto)
    }

    /// Statistics mixing logged and ignored namespaces
    pub fn sample_metrics() -> BTreeMap<String, String> {
        [
            ("Concolic::Solver::Constraint.foo", "1"),
            ("Concolic::Stats.bar", "2"),
            ("Ajax::calls", "5"),
            ("Other::x", "9"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    pub fn output(return_code: i32) -> AnalyzerOutput {
        AnalyzerOutput {
            return_code,
            metrics: Self::sample_metrics(),
        }
    }

    pub fn discovered_entry_points() -> Vec<String> {
        vec![
            "//input[@name='q']".to_string(),
            "//button[text()='Buy']".to_string(),
            "//a[@href='/next']".to_string(),
        ]
    }
}
