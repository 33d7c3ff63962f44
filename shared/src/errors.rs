//! Shared error types for the real-site harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Descriptor row {row} has {found} columns, expected 3")]
    MalformedRow { row: usize, found: usize },

    #[error("Duplicate task id '{id}' in descriptor")]
    DuplicateTaskId { id: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Descriptor could not be read: {message}")]
    DescriptorError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
