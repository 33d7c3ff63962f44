//! Run creation: timestamp, analyzer version label and run directory

use chrono::{DateTime, Local};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use shared::{stage_debug, stage_info, RunInfo, Stage};

use crate::error::HarnessResult;

/// Version label used when the analyzer checkout cannot be inspected
pub const UNKNOWN_VERSION: &str = "unknown";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the run directory for a start time
pub fn run_dir_name(started: &DateTime<Local>) -> String {
    format!("Test Suite Run {}", started.format(TIMESTAMP_FORMAT))
}

/// Describe a run started at `started` under `output_root`
pub fn run_info(output_root: &Path, started: DateTime<Local>, version: String) -> RunInfo {
    RunInfo {
        timestamp: started.format(TIMESTAMP_FORMAT).to_string(),
        version,
        output_dir: output_root.join(run_dir_name(&started)),
    }
}

/// Start a run now; the run directory is only created outside dry-run mode
pub async fn create_run(output_root: &Path, source_dir: Option<&Path>, dry_run: bool) -> HarnessResult<RunInfo> {
    let version = match source_dir {
        Some(dir) => analyzer_version(dir).await,
        None => UNKNOWN_VERSION.to_string(),
    };

    let run = run_info(output_root, Local::now(), version);

    if !dry_run {
        tokio::fs::create_dir_all(&run.output_dir).await?;
    }

    stage_info!(
        Stage::Suite,
        version = %run.version,
        output_dir = %run.output_dir.display(),
        dry_run,
        "Run created"
    );
    Ok(run)
}

/// Short commit hash of the analyzer checkout, or `unknown`
pub async fn analyzer_version(source_dir: &Path) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(source_dir)
        .args(["rev-parse", "--short", "HEAD"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if version.is_empty() {
                UNKNOWN_VERSION.to_string()
            } else {
                version
            }
        }
        Ok(output) => {
            stage_debug!(Stage::Suite, status = %output.status, "git rev-parse failed");
            UNKNOWN_VERSION.to_string()
        }
        Err(e) => {
            stage_debug!(Stage::Suite, error = %e, "git not available");
            UNKNOWN_VERSION.to_string()
        }
    }
}
