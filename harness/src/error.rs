//! Harness error types

use shared::SharedError;
use std::fmt;
use thiserror::Error;

/// The three failure kinds a test unit can signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Discovery tool, telemetry sink or harness I/O failed
    Infrastructure,
    /// The analyzer returned a non-zero code
    AnalyzerFailure,
    /// At least one fan-out child failed
    AggregateFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Infrastructure => write!(f, "InfrastructureError"),
            ErrorKind::AnalyzerFailure => write!(f, "AnalyzerFailure"),
            ErrorKind::AggregateFailure => write!(f, "AggregateFailure"),
        }
    }
}

/// A failed fan-out child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildFailure {
    pub child_id: String,
    pub kind: ErrorKind,
}

impl fmt::Display for ChildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.kind, self.child_id)
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("{component} failed: {message}")]
    Infrastructure { component: String, message: String },

    #[error("Analyzer call failed (returned {return_code})")]
    AnalyzerFailure { return_code: i32 },

    #[error("Errors occurred: {}", summarize(.failures))]
    AggregateFailure { failures: Vec<ChildFailure> },

    #[error("Telemetry sink has not been opened")]
    SinkNotOpen,

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

fn summarize(failures: &[ChildFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl HarnessError {
    /// Create an infrastructure error for the named collaborator
    pub fn infrastructure(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Infrastructure {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Classify this error into the three-kind taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::AnalyzerFailure { .. } => ErrorKind::AnalyzerFailure,
            HarnessError::AggregateFailure { .. } => ErrorKind::AggregateFailure,
            HarnessError::Infrastructure { .. }
            | HarnessError::SinkNotOpen
            | HarnessError::SharedError(_)
            | HarnessError::IoError(_)
            | HarnessError::CsvError(_)
            | HarnessError::HttpError(_) => ErrorKind::Infrastructure,
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
