//! gdb adapter used for crash forensics

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use shared::{stage_debug, Stage};

use crate::error::{HarnessError, HarnessResult};
use crate::traits::Debugger;

/// Runs `gdb -q -n -ex bt -batch <executable> <core>` next to the core dump
pub struct GdbDebugger {
    executable: PathBuf,
}

impl GdbDebugger {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn batch_args(analyzer: &Path, core_file: &Path) -> Vec<std::ffi::OsString> {
        vec![
            "-q".into(),
            "-n".into(),
            "-ex".into(),
            "bt".into(),
            "-batch".into(),
            analyzer.as_os_str().to_owned(),
            core_file.as_os_str().to_owned(),
        ]
    }
}

impl Default for GdbDebugger {
    fn default() -> Self {
        Self::new("gdb")
    }
}

#[async_trait]
impl Debugger for GdbDebugger {
    async fn backtrace(&self, executable: &Path, core_file: &Path, output: &Path) -> HarnessResult<()> {
        let working_dir = core_file.parent().unwrap_or_else(|| Path::new("."));

        // stdout and stderr both end up in the backtrace file
        let out = tokio::fs::File::create(output).await?.into_std().await;
        let err = out.try_clone()?;

        let status = Command::new(&self.executable)
            .args(Self::batch_args(executable, core_file))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err))
            .status()
            .await
            .map_err(|e| {
                HarnessError::infrastructure(
                    "debugger",
                    format!("could not launch {}: {}", self.executable.display(), e),
                )
            })?;

        stage_debug!(Stage::Forensics, %status, output = %output.display(), "Debugger finished");
        Ok(())
    }
}
