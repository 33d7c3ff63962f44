//! Real-site harness
//!
//! Holds the run metadata and the injected collaborators shared by every test
//! unit of a run. Units borrow the harness, so all of them see the same sink,
//! the same diagnostics log handle and the same run directory.

use std::path::PathBuf;

use shared::{stage_warn, RunInfo, Stage};

use crate::core::record::TelemetryRecord;
use crate::services::DiagnosticsLog;
use crate::traits::{Analyzer, Debugger, EntryPointFinder, TelemetrySink};

/// Default analyzer log categories
pub const DEFAULT_VERBOSITY: &str = "info,fatal,error";

/// Per-run knobs that do not belong to any collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Print analyzer command lines instead of running anything
    pub dry_run: bool,
    /// Analyzer executable, needed again by crash forensics
    pub analyzer_exec: PathBuf,
    /// Value of the analyzer's `-v` option
    pub verbosity: String,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            analyzer_exec: PathBuf::from("artemis"),
            verbosity: DEFAULT_VERBOSITY.to_string(),
        }
    }
}

/// Harness that generates and runs test units against real sites
pub struct SiteHarness<A, F, S, D>
where
    A: Analyzer,
    F: EntryPointFinder,
    S: TelemetrySink,
    D: Debugger,
{
    settings: HarnessSettings,
    run: RunInfo,

    /// Injected services
    pub(crate) analyzer: A,
    pub(crate) finder: F,
    pub(crate) debugger: D,
    sink: Option<S>,

    /// Shared analyzer diagnostics file
    pub(crate) diagnostics: DiagnosticsLog,
}

impl<A, F, S, D> SiteHarness<A, F, S, D>
where
    A: Analyzer,
    F: EntryPointFinder,
    S: TelemetrySink,
    D: Debugger,
{
    /// Create a harness with injected dependencies
    ///
    /// The sink must already be open when one is given.
    pub fn new(
        settings: HarnessSettings,
        run: RunInfo,
        analyzer: A,
        finder: F,
        sink: Option<S>,
        debugger: D,
        diagnostics: DiagnosticsLog,
    ) -> Self {
        Self {
            settings,
            run,
            analyzer,
            finder,
            debugger,
            sink,
            diagnostics,
        }
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub fn run_info(&self) -> &RunInfo {
        &self.run
    }

    pub fn is_dry_run(&self) -> bool {
        self.settings.dry_run
    }

    /// Sink to record outcomes to; never used in dry-run mode
    pub fn sink(&self) -> Option<&S> {
        if self.settings.dry_run {
            None
        } else {
            self.sink.as_ref()
        }
    }

    /// Send a record, logging and discarding any failure
    ///
    /// Returns whether the record was delivered.
    pub(crate) async fn send_best_effort(&self, record: &TelemetryRecord) -> bool {
        let Some(sink) = self.sink() else {
            return false;
        };

        match sink.append_row(record).await {
            Ok(()) => true,
            Err(e) => {
                stage_warn!(
                    Stage::Telemetry,
                    error = %e,
                    site = record.get(crate::core::columns::SITE).unwrap_or_default(),
                    "Telemetry record dropped"
                );
                false
            }
        }
    }
}
