//! Real analyzer process adapter
//!
//! Spawns the analyzer executable inside the task directory, waits for it
//! without a timeout and turns its exit status and printed statistics into an
//! [`AnalyzerOutput`].

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use shared::{stage_debug, stage_info, stage_warn, Stage};

use crate::error::{HarnessError, HarnessResult};
use crate::traits::{Analyzer, AnalyzerInvocation, AnalyzerOutput};

/// Marker lines around the statistics block on the analyzer's stdout
const STATISTICS_BEGIN: &str = "=== Statistics ===";
const STATISTICS_END: &str = "=== Statistics END ===";

pub const STDOUT_FILE: &str = "stdout.txt";
pub const STDERR_FILE: &str = "stderr.txt";

/// Real analyzer implementation
pub struct RealAnalyzer {
    executable: PathBuf,
}

impl RealAnalyzer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl Analyzer for RealAnalyzer {
    async fn invoke(&self, invocation: &AnalyzerInvocation) -> HarnessResult<AnalyzerOutput> {
        if invocation.dry_run {
            println!("{}", invocation.command_line(&self.executable));
            return Ok(AnalyzerOutput::default());
        }

        let task_dir = invocation.task_dir();
        tokio::fs::create_dir_all(&task_dir).await?;

        stage_debug!(
            Stage::Unit,
            task = %invocation.task_id,
            command = %invocation.command_line(&self.executable),
            "Spawning analyzer"
        );

        let output = Command::new(&self.executable)
            .args(invocation.args())
            .current_dir(&task_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                HarnessError::infrastructure(
                    "analyzer",
                    format!("could not launch {}: {}", self.executable.display(), e),
                )
            })?;

        tokio::fs::write(task_dir.join(STDOUT_FILE), &output.stdout).await?;
        tokio::fs::write(task_dir.join(STDERR_FILE), &output.stderr).await?;

        let return_code = exit_code(output.status);
        let metrics = parse_statistics(&String::from_utf8_lossy(&output.stdout));

        stage_info!(
            Stage::Unit,
            task = %invocation.task_id,
            return_code,
            metrics = metrics.len(),
            "Analyzer finished"
        );

        if return_code != 0 && !invocation.crash_tolerant {
            return Err(HarnessError::AnalyzerFailure { return_code });
        }

        Ok(AnalyzerOutput {
            return_code,
            metrics,
        })
    }
}

/// Parse the `Key: value` lines of the statistics block
///
/// Lines outside the block and lines without a `": "` separator are ignored.
/// A missing end marker closes the block at end of output.
pub fn parse_statistics(stdout: &str) -> BTreeMap<String, String> {
    let mut metrics = BTreeMap::new();
    let mut in_block = false;

    for line in stdout.lines() {
        let line = line.trim();
        match line {
            STATISTICS_BEGIN => in_block = true,
            STATISTICS_END => in_block = false,
            _ if in_block => {
                if let Some((key, value)) = line.split_once(": ") {
                    metrics.insert(key.trim().to_string(), value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    metrics
}

/// Return code of a finished process; `-<signal>` when it was killed
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            stage_warn!(Stage::Unit, signal = %signal_name(signal), "Analyzer terminated by signal");
            return -signal;
        }
    }

    -1
}

#[cfg(unix)]
fn signal_name(signal: i32) -> String {
    nix::sys::signal::Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| format!("signal {signal}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statistics_block_only() {
        let stdout = "\
Loading page
Concolic::Ignored: 1
=== Statistics ===
Concolic::ExecutionTree::DistinctTracesExplored: 4
Concolic::Solver::Constraint.17: sat
Ajax::calls: 2
no separator here
=== Statistics END ===
Ajax::after: 9
";
        let metrics = parse_statistics(stdout);

        assert_eq!(metrics.len(), 3);
        assert_eq!(
            metrics.get("Concolic::ExecutionTree::DistinctTracesExplored").map(String::as_str),
            Some("4")
        );
        assert_eq!(metrics.get("Concolic::Solver::Constraint.17").map(String::as_str), Some("sat"));
        assert!(!metrics.contains_key("Ajax::after"));
    }

    #[test]
    fn test_parse_statistics_without_block() {
        assert!(parse_statistics("crashed before printing anything\n").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_exit_is_negative() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait status for SIGSEGV without core
        let status = ExitStatus::from_raw(11);
        assert_eq!(exit_code(status), -11);
        assert_eq!(signal_name(11), "SIGSEGV");

        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(exit_code(status), 3);
    }
}
