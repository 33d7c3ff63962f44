//! Process-global analyzer diagnostics log
//!
//! The analyzer appends solver diagnostics to one fixed path shared by every
//! run on the machine. The harness truncates it before each analyzer call and
//! copies it into the task directory afterwards. The guard returned by
//! [`DiagnosticsLog::acquire`] must be held across truncate, invoke and copy,
//! otherwise concurrent units would mix their diagnostics.

use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

use shared::{stage_debug, Stage};

use crate::error::HarnessResult;

/// Default location the analyzer writes its constraint log to
pub const DEFAULT_DIAGNOSTICS_PATH: &str = "/tmp/constraintlog";

/// Name of the per-task copy inside the task directory
pub const CONSTRAINT_LOG_FILE: &str = "constraint-log.txt";

/// Serialized access to the shared diagnostics file
#[derive(Debug)]
pub struct DiagnosticsLog {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Exclusive access to the diagnostics file for one analyzer run
pub struct DiagnosticsGuard<'a> {
    path: &'a Path,
    _guard: MutexGuard<'a, ()>,
}

impl DiagnosticsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Wait for exclusive access to the diagnostics file
    pub async fn acquire(&self) -> DiagnosticsGuard<'_> {
        let guard = self.lock.lock().await;
        DiagnosticsGuard {
            path: &self.path,
            _guard: guard,
        }
    }
}

impl Default for DiagnosticsLog {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTICS_PATH)
    }
}

impl DiagnosticsGuard<'_> {
    /// Empty the file (creating it if missing)
    pub async fn truncate(&self) -> HarnessResult<()> {
        tokio::fs::write(self.path, b"").await?;
        stage_debug!(Stage::Unit, path = %self.path.display(), "Truncated diagnostics log");
        Ok(())
    }

    /// Copy the current contents to `dest`; a missing source yields an empty copy
    pub async fn copy_to(&self, dest: &Path) -> HarnessResult<()> {
        if tokio::fs::try_exists(self.path).await? {
            tokio::fs::copy(self.path, dest).await?;
        } else {
            tokio::fs::write(dest, b"").await?;
        }
        Ok(())
    }
}
