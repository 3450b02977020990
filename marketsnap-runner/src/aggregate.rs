//! Batch assembly: merge source groups, stamp one timestamp, sanitize.

use chrono::{DateTime, SecondsFormat, Utc};
use marketsnap_core::sanitize::sanitize;
use marketsnap_core::{Batch, Record, Row};
use tracing::warn;

/// Format a collection instant as `timestamp_utc` (RFC 3339, microseconds,
/// `+00:00` offset).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Assemble a batch stamped with the current time.
pub fn assemble(groups: Vec<Vec<Record>>) -> Batch {
    assemble_at(groups, Utc::now())
}

/// Assemble a batch stamped with `at`.
///
/// Empty groups are dropped; the rest keep group order and per-group order.
/// If nothing is left the batch is empty and a warning is logged.
pub fn assemble_at(groups: Vec<Vec<Record>>, at: DateTime<Utc>) -> Batch {
    let timestamp_utc = format_timestamp(at);

    let non_empty: Vec<Vec<Record>> = groups.into_iter().filter(|g| !g.is_empty()).collect();
    if non_empty.is_empty() {
        warn!("no data to save");
        return Batch::empty(timestamp_utc);
    }

    let rows = non_empty
        .iter()
        .flatten()
        .map(|record| sanitize(&Row::from_record(record, &timestamp_utc)))
        .collect();

    Batch {
        timestamp_utc,
        rows,
    }
}
