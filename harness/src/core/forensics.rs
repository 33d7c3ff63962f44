//! Best-effort backtrace capture after an analyzer crash

use std::path::{Path, PathBuf};

use shared::{stage_debug, stage_info, stage_warn, Stage};

use crate::traits::Debugger;

/// Core dump name the analyzer leaves in its working directory
pub const CORE_ARTIFACT: &str = "core";

/// Backtrace file written next to the core dump
pub const BACKTRACE_FILE: &str = "backtrace.txt";

/// A backtrace is worth capturing only for a failed run that left a core dump
pub fn should_capture(return_code: i32, task_dir: &Path) -> bool {
    return_code != 0 && task_dir.join(CORE_ARTIFACT).is_file()
}

/// Write a backtrace for a crashed analyzer run, then drop the core dump
///
/// Never fails: any problem is logged and `None` returned, so forensics can
/// not change the outcome of the test unit. The core dump is kept when the
/// debugger could not produce a backtrace.
pub async fn attempt_backtrace<D: Debugger + ?Sized>(
    debugger: &D,
    executable: &Path,
    task_dir: &Path,
    return_code: i32,
) -> Option<PathBuf> {
    if !should_capture(return_code, task_dir) {
        stage_debug!(Stage::Forensics, task_dir = %task_dir.display(), "No core dump to inspect");
        return None;
    }

    let core_file = task_dir.join(CORE_ARTIFACT);
    let output = task_dir.join(BACKTRACE_FILE);

    if let Err(e) = debugger.backtrace(executable, &core_file, &output).await {
        stage_warn!(Stage::Forensics, error = %e, core = %core_file.display(), "Backtrace capture failed");
        return None;
    }

    if let Err(e) = tokio::fs::remove_file(&core_file).await {
        stage_warn!(Stage::Forensics, error = %e, core = %core_file.display(), "Could not remove core dump");
    }

    stage_info!(Stage::Forensics, backtrace = %output.display(), return_code, "Captured backtrace");
    Some(output)
}
