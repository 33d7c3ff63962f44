//! Fan-out over discovered entry points
//!
//! One site unit asks the discovery tool for entry points and runs a child
//! test unit per entry point. Children are isolated from each other: every
//! child runs, and failures are collected into one aggregate error at the
//! end. A failure of discovery itself is not isolated.

use futures_util::FutureExt;
use std::time::Instant;

use shared::{child_id, logging, stage_info, stage_warn, Stage, Task};

use crate::core::discovery_log::DiscoveryLog;
use crate::core::record::{columns, format_elapsed, TelemetryRecord};
use crate::core::unit::{unit_name, TestUnit};
use crate::error::{ChildFailure, HarnessError, HarnessResult};
use crate::site_harness::SiteHarness;
use crate::traits::{Analyzer, Debugger, EntryPointFinder, TelemetrySink};

/// Entry point used in dry-run mode in place of the discovery tool's output
pub const DRY_RUN_ENTRY_POINT: &str = "EP-FROM-EXTERNAL-TOOL";

/// Analysis note for a site without entry points; not an error
pub const NO_ENTRY_POINTS: &str = "Entry point discovery returned no entry points.";

/// Pairs `(site id, task id)` where the task id has the shape of one of the
/// site's fan-out children (`{site}_{n}`, n >= 1)
///
/// Such a child would share its task directory and run log `Site` value
/// with the other task.
pub fn child_id_collisions(tasks: &[Task]) -> Vec<(String, String)> {
    let mut collisions = Vec::new();
    for site in tasks {
        for other in tasks {
            let is_child_shaped = other
                .id
                .strip_prefix(site.id.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .and_then(|index| index.parse::<usize>().ok())
                .is_some_and(|index| index >= 1 && child_id(&site.id, index) == other.id);
            if is_child_shaped {
                collisions.push((site.id.clone(), other.id.clone()));
            }
        }
    }
    collisions
}

impl<A, F, S, D> SiteHarness<A, F, S, D>
where
    A: Analyzer,
    F: EntryPointFinder,
    S: TelemetrySink,
    D: Debugger,
{
    /// Unit that discovers entry points for `site` and runs one child per entry point
    pub fn fan_out_unit<'a>(&'a self, site: Task, discovery_log: &'a DiscoveryLog) -> TestUnit<'a> {
        TestUnit::new(unit_name(&site.id), move || {
            async move { self.run_site(&site, discovery_log).await }.boxed()
        })
    }

    /// Discover, run every child, aggregate child failures
    pub async fn run_site(&self, site: &Task, discovery_log: &DiscoveryLog) -> HarnessResult<()> {
        let started = Instant::now();
        let discovered = self.discover(site).await;
        let discovery_time = format_elapsed(started.elapsed());

        let entry_points = match discovered {
            Ok(entry_points) => entry_points,
            Err(e) => {
                logging::log_error(Stage::FanOut, &format!("Entry point discovery for {}", site.id), &e);
                let mut record = TelemetryRecord::for_site(self.run_info(), site, &discovery_time);
                record.annotate_error(&e);
                self.send_best_effort(&record).await;
                return Err(e);
            }
        };

        if entry_points.is_empty() {
            stage_info!(Stage::FanOut, site = %site.id, "No entry points found");
            let mut record = TelemetryRecord::for_site(self.run_info(), site, &discovery_time);
            record.insert(columns::ANALYSIS, NO_ENTRY_POINTS);
            self.send_best_effort(&record).await;
            return Ok(());
        }

        logging::log_progress(
            Stage::FanOut,
            &site.id,
            &format!("{} entry points in {}", entry_points.len(), discovery_time),
        );

        let mut failures = Vec::new();
        println!();
        for (index, entry_point) in entry_points.into_iter().enumerate() {
            let child = site.child(index + 1, entry_point.as_str());
            let child_id = child.id.clone();
            discovery_log.append(&child.id, &child.url, &entry_point);

            match self.child_unit(child, discovery_time.clone()).execute().await {
                Ok(()) => println!("    {child_id}: OK"),
                Err(e) => {
                    println!("    {child_id}: ERROR");
                    println!("        {e}");
                    failures.push(ChildFailure {
                        child_id,
                        kind: e.kind(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            stage_warn!(Stage::FanOut, site = %site.id, failed = failures.len(), "Some entry points failed");
            Err(HarnessError::AggregateFailure { failures })
        }
    }

    /// Entry points for a site, in discovery order
    async fn discover(&self, site: &Task) -> HarnessResult<Vec<String>> {
        if self.is_dry_run() {
            return Ok(vec![DRY_RUN_ENTRY_POINT.to_string()]);
        }

        let site_dir = self.run_info().output_dir.join(&site.id);
        tokio::fs::create_dir_all(&site_dir).await?;
        self.finder.find_entry_points(&site.url, &site_dir).await
    }
}
