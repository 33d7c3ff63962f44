//! Suite driver
//!
//! Registers one unit per task (or per site in fan-out mode), runs them in
//! order and prints a verbose unit-test style report.

use std::collections::HashSet;
use std::io::Write;
use std::time::{Duration, Instant};

use shared::{logging, stage_info, stage_warn, SharedError, Stage, Task};

use crate::core::discovery_log::{DiscoveryLog, EP_LOG_FILE};
use crate::core::fan_out::child_id_collisions;
use crate::core::unit::TestUnit;
use crate::error::{ErrorKind, HarnessResult};
use crate::site_harness::SiteHarness;
use crate::traits::{Analyzer, Debugger, EntryPointFinder, TelemetrySink};

const SEPARATOR_HEAVY: &str =
    "======================================================================";
const SEPARATOR_LIGHT: &str =
    "----------------------------------------------------------------------";

/// How descriptor rows turn into units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteMode {
    /// One unit per task using its own entry point spec
    Single,
    /// One unit per site fanning out over discovered entry points
    FanOut,
}

/// A unit that did not pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUnit {
    pub name: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of a whole suite
#[derive(Debug, Clone, Default)]
pub struct SuiteSummary {
    pub passed: Vec<String>,
    pub failed: Vec<FailedUnit>,
    pub elapsed: Duration,
}

impl SuiteSummary {
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn was_successful(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered collection of uniquely named units
#[derive(Debug, Default)]
pub struct Suite<'a> {
    units: Vec<TestUnit<'a>>,
    names: HashSet<String>,
}

impl<'a> Suite<'a> {
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Add a unit; names must be unique within the suite
    pub fn register(&mut self, unit: TestUnit<'a>) -> HarnessResult<()> {
        if !self.names.insert(unit.name().to_string()) {
            return Err(SharedError::DuplicateTaskId {
                id: unit.name().to_string(),
            }
            .into());
        }
        self.units.push(unit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Run every unit in registration order; a failing unit never stops the suite
    pub async fn run(self) -> SuiteSummary {
        let started = Instant::now();
        let mut summary = SuiteSummary::default();

        for unit in self.units {
            let name = unit.name().to_string();
            print!("{name} ... ");
            let _ = std::io::stdout().flush();

            match unit.execute().await {
                Ok(()) => {
                    println!("ok");
                    summary.passed.push(name);
                }
                Err(e) => {
                    println!("FAIL");
                    summary.failed.push(FailedUnit {
                        name,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        summary.elapsed = started.elapsed();
        print_report(&summary);
        summary
    }
}

fn print_report(summary: &SuiteSummary) {
    for failure in &summary.failed {
        println!();
        println!("{SEPARATOR_HEAVY}");
        println!("FAIL: {}", failure.name);
        println!("{SEPARATOR_LIGHT}");
        println!("{}: {}", failure.kind, failure.message);
    }

    println!();
    println!("{SEPARATOR_LIGHT}");
    let total = summary.total();
    println!(
        "Ran {} test{} in {:.3}s",
        total,
        if total == 1 { "" } else { "s" },
        summary.elapsed.as_secs_f64()
    );
    println!();
    if summary.was_successful() {
        println!("OK");
    } else {
        println!("FAILED (failures={})", summary.failed.len());
    }
}

impl<A, F, S, D> SiteHarness<A, F, S, D>
where
    A: Analyzer,
    F: EntryPointFinder,
    S: TelemetrySink,
    D: Debugger,
{
    /// Register and run one unit per task, then persist the discovery log
    pub async fn run_suite(&self, tasks: Vec<Task>, mode: SuiteMode) -> HarnessResult<SuiteSummary> {
        let discovery_log = DiscoveryLog::new();
        let mut suite = Suite::new();

        if mode == SuiteMode::FanOut {
            for (site, task) in child_id_collisions(&tasks) {
                stage_warn!(
                    Stage::Suite,
                    site = %site,
                    task = %task,
                    "Fan-out children of this site may reuse the id and directory of another task"
                );
            }
        }

        for task in tasks {
            let unit = match mode {
                SuiteMode::Single => self.test_unit(task),
                SuiteMode::FanOut => self.fan_out_unit(task, &discovery_log),
            };
            suite.register(unit)?;
        }

        logging::log_startup(
            Stage::Suite,
            &format!("{} units ({:?} mode) in {}", suite.len(), mode, self.run_info().output_dir.display()),
        );

        let summary = suite.run().await;

        if mode == SuiteMode::FanOut && !self.is_dry_run() {
            let path = self.run_info().output_dir.join(EP_LOG_FILE);
            discovery_log.persist(&path)?;
            stage_info!(Stage::Suite, path = %path.display(), entries = discovery_log.len(), "Discovery log written");
        }

        if summary.was_successful() {
            logging::log_success(Stage::Suite, &format!("{} units passed", summary.total()));
        } else {
            stage_info!(Stage::Suite, failed = summary.failed.len(), total = summary.total(), "Suite finished with failures");
        }

        Ok(summary)
    }
}
