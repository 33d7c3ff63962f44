//! Task descriptor loading
//!
//! The descriptor is a CSV file with a header row and exactly three columns
//! per record: task id, URL and entry point (`auto` or a locator). Fields are
//! trimmed. Task ids must be unique since they name output directories and
//! test units.

use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use shared::{EntryPointSpec, SharedError, Task};

use crate::error::HarnessResult;

const DESCRIPTOR_COLUMNS: usize = 3;

/// Load the task list from a descriptor file
pub fn load_tasks(path: &Path) -> HarnessResult<Vec<Task>> {
    let file = File::open(path).map_err(|e| SharedError::DescriptorError {
        message: format!("{}: {}", path.display(), e),
    })?;
    parse_tasks(file)
}

/// Parse descriptor rows from any reader, in file order
pub fn parse_tasks<R: Read>(reader: R) -> HarnessResult<Vec<Task>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut tasks = Vec::new();

    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        // Header is row 1
        let row_number = index + 2;

        if row.len() != DESCRIPTOR_COLUMNS {
            return Err(SharedError::MalformedRow {
                row: row_number,
                found: row.len(),
            }
            .into());
        }

        let id = &row[0];
        if !seen.insert(id.to_string()) {
            return Err(SharedError::DuplicateTaskId { id: id.to_string() }.into());
        }

        tasks.push(Task::new(id, &row[1], EntryPointSpec::parse(&row[2])));
    }

    Ok(tasks)
}
