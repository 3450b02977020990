//! Export rows and the timestamped batch they travel in.

use super::record::{Category, Record};
use serde::{Deserialize, Serialize};

/// Column order shared by the CSV stores and the spreadsheet mirror.
pub const COLUMNS: [&str; 9] = [
    "timestamp_utc",
    "category",
    "name",
    "symbol",
    "value",
    "prev_close",
    "change_pct",
    "unit",
    "source",
];

/// A record flattened into the tabular export schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub timestamp_utc: String,
    pub category: Category,
    pub name: String,
    pub symbol: String,
    pub value: Option<f64>,
    pub prev_close: Option<f64>,
    pub change_pct: Option<f64>,
    pub unit: String,
    pub source: String,
}

impl Row {
    pub fn from_record(record: &Record, timestamp_utc: &str) -> Self {
        Self {
            timestamp_utc: timestamp_utc.to_string(),
            category: record.category,
            name: record.name.clone(),
            symbol: record.symbol.clone(),
            value: record.value(),
            prev_close: record.prev_close(),
            change_pct: record.change_pct(),
            unit: record.unit.clone(),
            source: record.source_tag(),
        }
    }

    /// String fields in [`COLUMNS`] order; absent numbers become empty fields.
    pub fn to_fields(&self) -> [String; 9] {
        [
            self.timestamp_utc.clone(),
            self.category.label().to_string(),
            self.name.clone(),
            self.symbol.clone(),
            format_number(self.value),
            format_number(self.prev_close),
            format_number(self.change_pct),
            self.unit.clone(),
            self.source.clone(),
        ]
    }
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Rows from one collection pass, all sharing one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub timestamp_utc: String,
    pub rows: Vec<Row>,
}

impl Batch {
    pub fn empty(timestamp_utc: impl Into<String>) -> Self {
        Self {
            timestamp_utc: timestamp_utc.into(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
