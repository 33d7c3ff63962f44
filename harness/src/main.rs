//! Entry point for the real-site harness binary
//!
//! Wires the real service implementations into a `SiteHarness` and runs the
//! suite described by a descriptor file.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use harness::{
    core::load_tasks,
    run::create_run,
    services::{DiagnosticsLog, GdbDebugger, HttpTelemetrySink, RealAnalyzer, RealEntryPointFinder},
    HarnessConfig, HarnessSettings, SiteHarness, SuiteMode, TelemetrySink,
};
use shared::{logging, stage_info, stage_warn, Stage};

/// Runs the concolic analyzer against a list of real sites
#[derive(Parser)]
#[command(name = "real-sites")]
#[command(about = "Runs the concolic analyzer against a list of real sites and logs the results")]
pub struct Args {
    /// CSV file with columns: site id, URL, entry point (`auto` or a locator)
    pub csv_file: PathBuf,

    /// Print the analyzer commands without running anything
    #[arg(long)]
    pub dryrun: bool,

    /// Discover entry points with the external tool and test each one
    #[arg(long)]
    pub external_ep_finder: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory the run directory is created in
    #[arg(long, default_value = ".")]
    pub output_root: PathBuf,

    /// Telemetry collector URL (overrides TELEMETRY_ENDPOINT)
    #[arg(long)]
    pub telemetry_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let config = HarnessConfig::from_env()
        .context("reading harness configuration")?
        .with_output_root(args.output_root.clone())
        .with_telemetry_endpoint(args.telemetry_endpoint.clone())
        .context("reading harness configuration")?;

    let tasks = load_tasks(&args.csv_file)
        .with_context(|| format!("loading sites from {}", args.csv_file.display()))?;
    stage_info!(Stage::Suite, sites = tasks.len(), file = %args.csv_file.display(), "Loaded site descriptor");

    let run = create_run(&config.output_root, config.analyzer_source_dir.as_deref(), args.dryrun)
        .await
        .context("creating run directory")?;

    let sink = match config.telemetry_endpoint {
        Some(ref endpoint) if !args.dryrun => {
            let mut sink = HttpTelemetrySink::new(endpoint.clone()).with_token(config.telemetry_token.clone());
            sink.open().await.context("opening telemetry sink")?;
            Some(sink)
        }
        Some(_) => None,
        None => {
            stage_warn!(Stage::Telemetry, "No telemetry endpoint configured, results are not logged");
            None
        }
    };

    let settings = HarnessSettings {
        dry_run: args.dryrun,
        analyzer_exec: config.analyzer_exec.clone(),
        verbosity: config.verbosity.clone(),
    };

    let harness = SiteHarness::new(
        settings,
        run,
        RealAnalyzer::new(config.analyzer_exec.clone()),
        RealEntryPointFinder::new(config.entry_point_finder.clone()),
        sink,
        GdbDebugger::new(config.debugger_exec.clone()),
        DiagnosticsLog::new(config.diagnostics_log.clone()),
    );

    let mode = if args.external_ep_finder {
        SuiteMode::FanOut
    } else {
        SuiteMode::Single
    };

    let summary = harness.run_suite(tasks, mode).await.context("running suite")?;

    if !summary.was_successful() {
        std::process::exit(1);
    }
    Ok(())
}
