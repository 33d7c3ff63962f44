//! Harness configuration
//!
//! Tool locations and telemetry settings are read from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Environment variables take precedence over `.env` values, and command-line
//! flags (applied through the `with_*` setters) take precedence over both.
//!
//! Tools run inside per-task directories, so a relative tool path with a
//! directory part (`./build/artemis`) is made absolute against the harness's
//! working directory. Bare names (`gdb`) are left for `PATH` lookup.
//!
//! ## Variables
//! - `ANALYZER_EXEC`: analyzer executable (default `artemis`)
//! - `ANALYZER_SOURCE_DIR`: analyzer git checkout used for the version label
//! - `ENTRY_POINT_FINDER`: discovery tool executable (default `entrypoint-finder`)
//! - `DEBUGGER_EXEC`: debugger used for backtraces (default `gdb`)
//! - `DIAGNOSTICS_LOG`: analyzer constraint log (default `/tmp/constraintlog`)
//! - `ANALYZER_VERBOSITY`: analyzer `-v` value (default `info,fatal,error`)
//! - `TELEMETRY_ENDPOINT`: HTTP collector for the run log
//! - `TELEMETRY_TOKEN`: bearer token for the collector

use std::path::{Path, PathBuf};

use shared::{SharedError, SharedResult};

use crate::services::diagnostics_log::DEFAULT_DIAGNOSTICS_PATH;
use crate::site_harness::DEFAULT_VERBOSITY;

pub const DEFAULT_ANALYZER_EXEC: &str = "artemis";
pub const DEFAULT_ENTRY_POINT_FINDER: &str = "entrypoint-finder";
pub const DEFAULT_DEBUGGER_EXEC: &str = "gdb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub analyzer_exec: PathBuf,
    pub analyzer_source_dir: Option<PathBuf>,
    pub entry_point_finder: PathBuf,
    pub debugger_exec: PathBuf,
    pub diagnostics_log: PathBuf,
    pub verbosity: String,
    pub telemetry_endpoint: Option<String>,
    pub telemetry_token: Option<String>,
    pub output_root: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            analyzer_exec: PathBuf::from(DEFAULT_ANALYZER_EXEC),
            analyzer_source_dir: None,
            entry_point_finder: PathBuf::from(DEFAULT_ENTRY_POINT_FINDER),
            debugger_exec: PathBuf::from(DEFAULT_DEBUGGER_EXEC),
            diagnostics_log: PathBuf::from(DEFAULT_DIAGNOSTICS_PATH),
            verbosity: DEFAULT_VERBOSITY.to_string(),
            telemetry_endpoint: None,
            telemetry_token: None,
            output_root: PathBuf::from("."),
        }
    }
}

impl HarnessConfig {
    /// Load from `.env` and the process environment
    pub fn from_env() -> SharedResult<Self> {
        // Missing .env is fine
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup; empty values count as unset
    pub fn from_lookup<L>(lookup: L) -> SharedResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let tool = |key: &str, default: PathBuf| match get(key) {
            Some(path) => resolve_tool_path(key, Path::new(&path)),
            None => Ok(default),
        };

        let config = Self {
            analyzer_exec: tool("ANALYZER_EXEC", defaults.analyzer_exec)?,
            analyzer_source_dir: get("ANALYZER_SOURCE_DIR").map(PathBuf::from),
            entry_point_finder: tool("ENTRY_POINT_FINDER", defaults.entry_point_finder)?,
            debugger_exec: tool("DEBUGGER_EXEC", defaults.debugger_exec)?,
            diagnostics_log: get("DIAGNOSTICS_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.diagnostics_log),
            verbosity: get("ANALYZER_VERBOSITY").unwrap_or(defaults.verbosity),
            telemetry_endpoint: get("TELEMETRY_ENDPOINT"),
            telemetry_token: get("TELEMETRY_TOKEN"),
            output_root: defaults.output_root,
        };

        config.validate()?;
        Ok(config)
    }

    /// Override the output root (fluent API)
    pub fn with_output_root(mut self, output_root: PathBuf) -> Self {
        self.output_root = output_root;
        self
    }

    /// Override the telemetry endpoint when one is given (fluent API)
    pub fn with_telemetry_endpoint(mut self, endpoint: Option<String>) -> SharedResult<Self> {
        if endpoint.is_some() {
            self.telemetry_endpoint = endpoint;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> SharedResult<()> {
        if let Some(ref endpoint) = self.telemetry_endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(SharedError::InvalidConfig {
                    field: "TELEMETRY_ENDPOINT".to_string(),
                    value: endpoint.clone(),
                });
            }
        }

        if self.verbosity.contains(char::is_whitespace) {
            return Err(SharedError::InvalidConfig {
                field: "ANALYZER_VERBOSITY".to_string(),
                value: self.verbosity.clone(),
            });
        }

        Ok(())
    }
}

/// Absolute form of a relative tool path that names a directory; bare names
/// and absolute paths are returned unchanged
pub fn resolve_tool_path(field: &str, path: &Path) -> SharedResult<PathBuf> {
    if path.is_absolute() || path.components().count() < 2 {
        return Ok(path.to_path_buf());
    }
    std::path::absolute(path).map_err(|_| SharedError::InvalidConfig {
        field: field.to_string(),
        value: path.display().to_string(),
    })
}
