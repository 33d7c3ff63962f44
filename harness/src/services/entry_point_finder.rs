//! Real entry-point discovery tool adapter

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use shared::{stage_debug, Stage};

use crate::error::{HarnessError, HarnessResult};
use crate::traits::EntryPointFinder;

const COMPONENT: &str = "entry point finder";

/// Runs `<executable> <url>` and reads one locator per stdout line
pub struct RealEntryPointFinder {
    executable: PathBuf,
}

impl RealEntryPointFinder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl EntryPointFinder for RealEntryPointFinder {
    async fn find_entry_points(&self, url: &str, output_dir: &Path) -> HarnessResult<Vec<String>> {
        let output = Command::new(&self.executable)
            .arg(url)
            .current_dir(output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                HarnessError::infrastructure(
                    COMPONENT,
                    format!("could not launch {}: {}", self.executable.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::infrastructure(
                COMPONENT,
                format!("{} ({})", output.status, stderr.trim()),
            ));
        }

        let entry_points = parse_entry_points(&String::from_utf8_lossy(&output.stdout));
        stage_debug!(Stage::FanOut, url, found = entry_points.len(), "Entry point discovery finished");
        Ok(entry_points)
    }
}

/// Non-empty trimmed lines, in order
fn parse_entry_points(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
