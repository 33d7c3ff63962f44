//! Test helpers and builder patterns for harness tests
//!
//! The builder wires mockall mocks into a `SiteHarness` whose run directory
//! and diagnostics log live in a temporary directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use harness::core::{columns, TelemetryRecord};
use harness::services::DiagnosticsLog;
use harness::traits::{
    AnalyzerInvocation, AnalyzerOutput, MockAnalyzer, MockDebugger, MockEntryPointFinder, MockTelemetrySink,
};
use harness::{HarnessError, HarnessResult, HarnessSettings, SiteHarness};
use tempfile::TempDir;

use super::fixtures::TestFixtures;

pub type MockHarness = SiteHarness<MockAnalyzer, MockEntryPointFinder, MockTelemetrySink, MockDebugger>;

/// Rows delivered to and attempts made against a mock sink
#[derive(Clone, Default)]
pub struct SinkRecorder {
    rows: Arc<Mutex<Vec<TelemetryRecord>>>,
    attempts: Arc<AtomicUsize>,
}

impl SinkRecorder {
    /// Delivered rows, in order
    pub fn rows(&self) -> Vec<TelemetryRecord> {
        self.rows.lock().unwrap().clone()
    }

    /// Every `append_row` call, delivered or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The only delivered row
    pub fn single_row(&self) -> TelemetryRecord {
        let rows = self.rows();
        assert_eq!(rows.len(), 1, "Expected exactly one telemetry row, got {rows:?}");
        rows.into_iter().next().unwrap()
    }

    /// Delivered row for a site or child id
    pub fn row_for(&self, site: &str) -> Option<TelemetryRecord> {
        self.rows().into_iter().find(|row| row.get("Site") == Some(site))
    }

    /// Mock sink whose first `failures` appends fail
    fn sink(&self, failures: usize) -> MockTelemetrySink {
        let rows = Arc::clone(&self.rows);
        let attempts = Arc::clone(&self.attempts);
        let mut sink = MockTelemetrySink::new();
        sink.expect_append_row().times(0..).returning(move |record| {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < failures {
                return Err(HarnessError::infrastructure("telemetry sink", "HTTP 503"));
            }
            rows.lock().unwrap().push(record.clone());
            Ok(())
        });
        sink
    }
}

/// Harness plus the temporary directory backing it
pub struct TestHarness {
    pub harness: MockHarness,
    pub sink: SinkRecorder,
    pub workspace: TempDir,
}

impl TestHarness {
    pub fn run_dir(&self) -> PathBuf {
        self.workspace.path().join("run")
    }

    pub fn diagnostics_path(&self) -> PathBuf {
        self.workspace.path().join("constraintlog")
    }

    pub fn task_dir(&self, task_id: &str) -> PathBuf {
        self.run_dir().join(task_id)
    }
}

/// Builder pattern for creating test harnesses with sensible defaults
pub struct HarnessBuilder {
    workspace: TempDir,
    dry_run: bool,
    with_sink: bool,
    sink_failures: usize,
    analyzer: Option<MockAnalyzer>,
    finder: Option<MockEntryPointFinder>,
    debugger: Option<MockDebugger>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            workspace: TempDir::new().unwrap(),
            dry_run: false,
            with_sink: true,
            sink_failures: 0,
            analyzer: None,
            finder: None,
            debugger: None,
        }
    }

    /// Where the diagnostics log of the built harness will live
    pub fn diagnostics_path(&self) -> PathBuf {
        self.workspace.path().join("constraintlog")
    }

    pub fn run_dir(&self) -> PathBuf {
        self.workspace.path().join("run")
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn without_sink(mut self) -> Self {
        self.with_sink = false;
        self
    }

    /// Make the first `failures` sink appends fail
    pub fn with_sink_failures(mut self, failures: usize) -> Self {
        self.sink_failures = failures;
        self
    }

    /// Configure the analyzer mock with a setup function
    pub fn with_analyzer<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockAnalyzer),
    {
        let mut analyzer = MockAnalyzer::new();
        setup(&mut analyzer);
        self.analyzer = Some(analyzer);
        self
    }

    /// Analyzer answering every invocation with `respond`
    pub fn with_analyzer_fn<F>(self, respond: F) -> Self
    where
        F: Fn(&AnalyzerInvocation) -> HarnessResult<AnalyzerOutput> + Send + 'static,
    {
        self.with_analyzer(move |analyzer| {
            analyzer.expect_invoke().times(0..).returning(move |invocation| respond(invocation));
        })
    }

    /// Configure the discovery tool mock with a setup function
    pub fn with_finder<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockEntryPointFinder),
    {
        let mut finder = MockEntryPointFinder::new();
        setup(&mut finder);
        self.finder = Some(finder);
        self
    }

    /// Discovery tool returning `entry_points` for every site
    pub fn with_entry_points(self, entry_points: Vec<String>) -> Self {
        self.with_finder(move |finder| {
            finder
                .expect_find_entry_points()
                .times(0..)
                .returning(move |_, _| Ok(entry_points.clone()));
        })
    }

    /// Configure the debugger mock with a setup function
    pub fn with_debugger<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockDebugger),
    {
        let mut debugger = MockDebugger::new();
        setup(&mut debugger);
        self.debugger = Some(debugger);
        self
    }

    pub fn build(self) -> TestHarness {
        let run_dir = self.run_dir();
        let diagnostics_path = self.diagnostics_path();
        if !self.dry_run {
            std::fs::create_dir_all(&run_dir).unwrap();
        }
        std::fs::write(&diagnostics_path, TestFixtures::STALE_DIAGNOSTICS).unwrap();

        let analyzer = self.analyzer.unwrap_or_else(|| {
            let mut analyzer = MockAnalyzer::new();
            analyzer
                .expect_invoke()
                .times(0..)
                .returning(|_| Ok(TestFixtures::output(0)));
            analyzer
        });

        let finder = self.finder.unwrap_or_else(|| {
            let mut finder = MockEntryPointFinder::new();
            finder.expect_find_entry_points().times(0..).returning(|_, _| Ok(vec![]));
            finder
        });

        let debugger = self.debugger.unwrap_or_else(|| {
            let mut debugger = MockDebugger::new();
            debugger.expect_backtrace().times(0..).returning(|_, _, _| Ok(()));
            debugger
        });

        let recorder = SinkRecorder::default();
        let sink = self.with_sink.then(|| recorder.sink(self.sink_failures));

        let settings = HarnessSettings {
            dry_run: self.dry_run,
            analyzer_exec: PathBuf::from(TestFixtures::ANALYZER_EXEC),
            verbosity: "info,fatal,error".to_string(),
        };

        let harness = SiteHarness::new(
            settings,
            TestFixtures::run_info(&run_dir),
            analyzer,
            finder,
            sink,
            debugger,
            DiagnosticsLog::new(diagnostics_path),
        );

        TestHarness {
            harness,
            sink: recorder,
            workspace: self.workspace,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assertion and setup helpers shared by the test suites
pub struct TestHelpers;

impl TestHelpers {
    /// Simulate the analyzer writing its diagnostics and optionally a core dump
    pub fn simulate_run(invocation: &AnalyzerInvocation, diagnostics: &Path, dump_core: bool) {
        std::fs::write(diagnostics, TestFixtures::RUN_DIAGNOSTICS).unwrap();
        let task_dir = invocation.task_dir();
        std::fs::create_dir_all(&task_dir).unwrap();
        if dump_core {
            std::fs::write(task_dir.join("core"), b"\x7fELF").unwrap();
        }
    }

    /// Column names of a record that are not base or outcome columns
    pub fn metric_columns(record: &TelemetryRecord) -> Vec<String> {
        record
            .columns()
            .map(|(column, _)| column)
            .filter(|column| !columns::is_reserved(column))
            .map(str::to_string)
            .collect()
    }
}
