//! Service-specific tests
//!
//! Each service has its own test file. Process adapters are exercised
//! against small shell scripts standing in for the real tools.

#[cfg(test)]
mod telemetry;

// Common test utilities for services
#[cfg(test)]
pub mod common {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// Standard timeout for operations that are expected to block
    pub const BLOCKED_TIMEOUT: Duration = Duration::from_millis(100);

    /// Write an executable `/bin/sh` script standing in for an external tool
    #[cfg(unix)]
    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Script should be writable");
        let mut permissions = std::fs::metadata(&path).expect("Script exists").permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).expect("Script should be executable");
        path
    }
}
