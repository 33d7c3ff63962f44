//! Test-unit generation
//!
//! A test unit runs the analyzer once for one task: clear the diagnostics
//! log, invoke and time the analyzer, collect artifacts, capture a backtrace
//! after a crash and record telemetry. Telemetry is always sent before the
//! unit reports a failure.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::time::Instant;

use shared::{stage_debug, stage_info, stage_warn, ExecutionReport, Stage, Task};

use crate::core::forensics;
use crate::core::metrics::report_metrics;
use crate::core::record::{columns, format_elapsed, TelemetryRecord};
use crate::error::{HarnessError, HarnessResult};
use crate::services::diagnostics_log::CONSTRAINT_LOG_FILE;
use crate::site_harness::SiteHarness;
use crate::traits::{Analyzer, AnalyzerInvocation, Debugger, EntryPointFinder, TelemetrySink};

/// Boxed body of a test unit
pub type UnitFuture<'a> = BoxFuture<'a, HarnessResult<()>>;

/// Named, zero-argument executable unit
pub struct TestUnit<'a> {
    name: String,
    body: Box<dyn FnOnce() -> UnitFuture<'a> + Send + 'a>,
}

impl<'a> TestUnit<'a> {
    pub fn new<B>(name: impl Into<String>, body: B) -> Self
    where
        B: FnOnce() -> UnitFuture<'a> + Send + 'a,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the unit to completion
    pub async fn execute(self) -> HarnessResult<()> {
        (self.body)().await
    }
}

impl std::fmt::Debug for TestUnit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestUnit").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Name a unit is registered under: `test_<id>` without whitespace
pub fn unit_name(task_id: &str) -> String {
    let id: String = task_id.chars().filter(|c| !c.is_whitespace()).collect();
    format!("test_{id}")
}

impl<A, F, S, D> SiteHarness<A, F, S, D>
where
    A: Analyzer,
    F: EntryPointFinder,
    S: TelemetrySink,
    D: Debugger,
{
    /// Unit for a task taken directly from the descriptor
    pub fn test_unit(&self, task: Task) -> TestUnit<'_> {
        TestUnit::new(unit_name(&task.id), move || {
            async move { self.run_task(&task, "").await }.boxed()
        })
    }

    /// Unit for a fan-out child, carrying its parent's discovery time
    pub fn child_unit(&self, task: Task, discovery_time: String) -> TestUnit<'_> {
        TestUnit::new(unit_name(&task.id), move || {
            async move { self.run_task(&task, &discovery_time).await }.boxed()
        })
    }

    /// Run the analyzer for one task and record exactly one telemetry row
    pub async fn run_task(&self, task: &Task, discovery_time: &str) -> HarnessResult<()> {
        let mut record = TelemetryRecord::for_task(self.run_info(), task, discovery_time);

        let result = match self.execute_task(task, &mut record).await {
            Ok(Some(report)) if !report.succeeded() => Err(HarnessError::AnalyzerFailure {
                return_code: report.return_code,
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                // The record may or may not have been sent; annotate and retry once
                record.annotate_error(&e);
                self.send_best_effort(&record).await;
                Err(e)
            }
        };

        match result {
            Ok(()) => stage_info!(Stage::Unit, task = %task.id, "Task passed"),
            Err(ref e) => stage_warn!(Stage::Unit, task = %task.id, kind = %e.kind(), error = %e, "Task failed"),
        }
        result
    }

    /// Clear, invoke, collect and report; `None` in dry-run mode
    async fn execute_task(
        &self,
        task: &Task,
        record: &mut TelemetryRecord,
    ) -> HarnessResult<Option<ExecutionReport>> {
        let settings = self.settings();
        let invocation = AnalyzerInvocation::concolic(
            task,
            &settings.verbosity,
            &self.run_info().output_dir,
            settings.dry_run,
        );

        if settings.dry_run {
            self.analyzer.invoke(&invocation).await?;
            return Ok(None);
        }

        // Held until this run's diagnostics have been copied out
        let diagnostics = self.diagnostics.acquire().await;
        diagnostics.truncate().await?;

        stage_debug!(Stage::Unit, task = %task.id, url = %task.url, entry_point = %task.entry_point, "Invoking analyzer");
        let started = Instant::now();
        let output = self.analyzer.invoke(&invocation).await?;
        let report = ExecutionReport {
            return_code: output.return_code,
            elapsed: started.elapsed(),
            metrics: output.metrics,
        };

        record.insert(columns::RUNNING_TIME, format_elapsed(report.elapsed));
        record.insert(columns::EXIT_CODE, report.return_code.to_string());

        let task_dir = invocation.task_dir();
        tokio::fs::create_dir_all(&task_dir).await?;
        diagnostics.copy_to(&task_dir.join(CONSTRAINT_LOG_FILE)).await?;
        drop(diagnostics);

        forensics::attempt_backtrace(&self.debugger, &settings.analyzer_exec, &task_dir, report.return_code).await;

        report_metrics(self.sink(), record, &report.metrics).await?;
        Ok(Some(report))
    }
}
