//! Trait definitions with mockall annotations for testing
//!
//! Every external collaborator of the harness (the analyzer executable, the
//! entry-point discovery tool, the telemetry sink and the debugger used for
//! crash forensics) sits behind one of these traits so the test-unit pipeline
//! can be exercised without real processes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use shared::Task;

use crate::core::record::TelemetryRecord;
use crate::error::HarnessResult;

/// Analyzer mode used for every real-site run
pub const CONCOLIC_MODE: &str = "concolic";

/// Execution tree detail requested from the analyzer
pub const FINAL_OVERVIEW_TREE: &str = "final-overview";

/// Full configuration of one analyzer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerInvocation {
    pub task_id: String,
    pub url: String,
    pub iterations: u32,
    pub major_mode: String,
    pub tree_output: String,
    pub verbosity: String,
    /// Entry point override, `None` lets the analyzer choose
    pub entry_point: Option<String>,
    pub dry_run: bool,
    /// The analyzer works inside `<output_parent_dir>/<task_id>`
    pub output_parent_dir: PathBuf,
    /// Report a non-zero return code instead of failing the call
    pub crash_tolerant: bool,
}

impl AnalyzerInvocation {
    /// Concolic, zero-iteration, final-overview run of a task
    pub fn concolic(task: &Task, verbosity: &str, output_parent_dir: &Path, dry_run: bool) -> Self {
        Self {
            task_id: task.id.clone(),
            url: task.url.clone(),
            iterations: 0,
            major_mode: CONCOLIC_MODE.to_string(),
            tree_output: FINAL_OVERVIEW_TREE.to_string(),
            verbosity: verbosity.to_string(),
            entry_point: task.entry_point.override_locator().map(str::to_string),
            dry_run,
            output_parent_dir: output_parent_dir.to_path_buf(),
            crash_tolerant: true,
        }
    }

    /// Directory the analyzer runs in and writes its artifacts to
    pub fn task_dir(&self) -> PathBuf {
        self.output_parent_dir.join(&self.task_id)
    }

    /// Command-line arguments for the analyzer executable
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            self.iterations.to_string(),
            "--major-mode".to_string(),
            self.major_mode.clone(),
            "--concolic-tree-output".to_string(),
            self.tree_output.clone(),
            "-v".to_string(),
            self.verbosity.clone(),
        ];

        if let Some(ref entry_point) = self.entry_point {
            args.push("--concolic-button".to_string());
            args.push(entry_point.clone());
        }

        args.push(self.url.clone());
        args
    }

    /// Printable command line (used for dry runs)
    pub fn command_line(&self, executable: &Path) -> String {
        let mut parts = vec![executable.display().to_string()];
        parts.extend(self.args().into_iter().map(|arg| {
            if arg.contains(char::is_whitespace) || arg.is_empty() {
                format!("'{arg}'")
            } else {
                arg
            }
        }));
        parts.join(" ")
    }
}

/// Raw result of an analyzer process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyzerOutput {
    pub return_code: i32,
    pub metrics: BTreeMap<String, String>,
}

/// Analyzer process abstraction
///
/// One call runs the analyzer once and blocks until it exits. No timeout is
/// applied.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    /// Run the analyzer with the given configuration
    ///
    /// # Returns
    /// The return code and statistics of the run. In dry-run mode the command
    /// is only printed and an empty output is returned.
    async fn invoke(&self, invocation: &AnalyzerInvocation) -> HarnessResult<AnalyzerOutput>;
}

/// Entry-point discovery tool abstraction
#[mockall::automock]
#[async_trait::async_trait]
pub trait EntryPointFinder: Send + Sync {
    /// Find candidate entry points for a site
    ///
    /// # Parameters
    /// - `url`: Page to inspect
    /// - `output_dir`: Directory the tool may write its own artifacts to
    ///
    /// # Returns
    /// Entry-point locators in discovery order (possibly empty)
    async fn find_entry_points(&self, url: &str, output_dir: &Path) -> HarnessResult<Vec<String>>;
}

/// Remote telemetry sink abstraction
#[mockall::automock]
#[async_trait::async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Open the sink; rows are rejected before this succeeds
    async fn open(&mut self) -> HarnessResult<()>;

    /// Append one flat record as a row
    async fn append_row(&self, record: &TelemetryRecord) -> HarnessResult<()>;
}

/// Non-interactive debugger used to capture backtraces from core files
#[mockall::automock]
#[async_trait::async_trait]
pub trait Debugger: Send + Sync {
    /// Write a backtrace of `core_file` (produced by `executable`) to `output`
    async fn backtrace(&self, executable: &Path, core_file: &Path, output: &Path) -> HarnessResult<()>;
}
