//! Selection and renaming of analyzer statistics for the run log
//!
//! Only the concolic and AJAX namespaces are interesting for the run log.
//! Per-constraint solver statistics are excluded: there is one key per
//! solved constraint, which would add an unbounded number of columns.

use std::collections::BTreeMap;

use shared::{stage_warn, Stage};

use crate::core::record::{columns, TelemetryRecord};
use crate::error::HarnessResult;
use crate::traits::TelemetrySink;

const CONCOLIC_PREFIX: &str = "concolic::";
const CONSTRAINT_PREFIX: &str = "concolic::solver::constraint.";
const AJAX_PREFIX: &str = "ajax::";

/// Separators that get a line break appended in column headers
const SEPARATORS: [&str; 2] = ["::", "."];

fn has_prefix(key: &str, prefix: &str) -> bool {
    key.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Namespace prefix length to strip from `key`, or `None` if it is not logged
fn selected_prefix(key: &str) -> Option<usize> {
    if has_prefix(key, CONCOLIC_PREFIX) && !has_prefix(key, CONSTRAINT_PREFIX) {
        Some(CONCOLIC_PREFIX.len())
    } else if has_prefix(key, AJAX_PREFIX) {
        Some(AJAX_PREFIX.len())
    } else {
        None
    }
}

/// Display column for a metric key with its namespace already stripped
pub fn column_name(stripped_key: &str) -> String {
    let mut column = String::with_capacity(stripped_key.len() + 4);
    let mut rest = stripped_key;

    while !rest.is_empty() {
        if let Some(sep) = SEPARATORS.iter().find(|sep| rest.starts_with(**sep)) {
            column.push_str(sep);
            column.push('\n');
            rest = &rest[sep.len()..];
        } else if let Some(ch) = rest.chars().next() {
            column.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }

    column
}

/// Columns to add to a telemetry record for the given analyzer statistics
///
/// A statistic whose column would shadow a harness column is dropped.
pub fn extract_columns(metrics: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    metrics
        .iter()
        .filter_map(|(key, value)| {
            let column = column_name(&key[selected_prefix(key)?..]);
            if columns::is_reserved(&column) {
                stage_warn!(Stage::Telemetry, statistic = %key, "Statistic clashes with a run log column, dropped");
                return None;
            }
            Some((column, value.clone()))
        })
        .collect()
}

/// Add the selected statistics to `record` and append it to the sink
///
/// Does nothing when no sink is configured.
pub async fn report_metrics<S: TelemetrySink + ?Sized>(
    sink: Option<&S>,
    record: &mut TelemetryRecord,
    metrics: &BTreeMap<String, String>,
) -> HarnessResult<()> {
    let Some(sink) = sink else {
        return Ok(());
    };

    for (column, value) in extract_columns(metrics) {
        record.insert(column, value);
    }
    sink.append_row(record).await
}
