//! Spreadsheet mirror — best-effort copy of the batch into a shared sheet.
//!
//! Two targets in one spreadsheet: a history sheet that only grows, and a
//! latest sheet that is cleared and rewritten every pass. Nothing in here can
//! fail the pass: missing configuration is a `Skipped` outcome and every
//! remote error becomes `Failed`.

#[cfg(feature = "sheets")]
pub mod google;

use marketsnap_core::config::SheetNames;
use marketsnap_core::sanitize::sanitize_for_sheet;
use marketsnap_core::{Batch, Row, COLUMNS};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

/// Initial grid size for a newly created history sheet.
const HISTORY_GRID_ROWS: u32 = 1000;
/// Initial grid size for a newly created latest sheet.
const LATEST_GRID_ROWS: u32 = 100;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("invalid credentials JSON: {0}")]
    InvalidCredentials(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("sheets API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected sheets API payload: {0}")]
    Payload(String),
}

/// Capability: the handful of spreadsheet operations the mirror needs.
pub trait SheetService {
    fn sheet_exists(&self, title: &str) -> Result<bool, SheetError>;

    fn add_sheet(&self, title: &str, rows: u32, cols: u32) -> Result<(), SheetError>;

    /// Remove every value from the sheet, keeping the sheet itself.
    fn clear(&self, title: &str) -> Result<(), SheetError>;

    /// Append rows after the last non-empty row.
    fn append_rows(&self, title: &str, rows: &[Vec<Value>]) -> Result<(), SheetError>;
}

/// What happened to the mirror this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Pushed { rows: usize },
    /// Preconditions not met; not an error.
    Skipped(String),
    Failed(String),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Pushed { .. })
    }
}

/// Mirror settings, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct MirrorConfig {
    /// Service-account key JSON.
    pub credentials_json: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub names: SheetNames,
}

pub struct SheetSynchronizer {
    config: MirrorConfig,
}

impl SheetSynchronizer {
    pub fn new(config: MirrorConfig) -> Self {
        Self { config }
    }

    /// Check preconditions, connect, and mirror the batch.
    pub fn sync(&self, batch: &Batch) -> SyncOutcome {
        if !cfg!(feature = "sheets") {
            return skipped("sheets support not compiled in");
        }
        let Some(credentials) = present(&self.config.credentials_json) else {
            return skipped("GOOGLE_SHEETS_CREDENTIALS_JSON not set");
        };
        let Some(spreadsheet_id) = present(&self.config.spreadsheet_id) else {
            return skipped("GOOGLE_SHEETS_SPREADSHEET_ID not set");
        };
        self.connect_and_sync(credentials, spreadsheet_id, batch)
    }

    #[cfg(feature = "sheets")]
    fn connect_and_sync(&self, credentials: &str, spreadsheet_id: &str, batch: &Batch) -> SyncOutcome {
        match google::GoogleSheetsClient::connect(credentials, spreadsheet_id) {
            Ok(client) => self.sync_with(&client, batch),
            Err(e) => {
                error!(spreadsheet_id, error = %e, "failed to connect to Google Sheets");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    #[cfg(not(feature = "sheets"))]
    fn connect_and_sync(&self, _credentials: &str, _spreadsheet_id: &str, _batch: &Batch) -> SyncOutcome {
        skipped("sheets support not compiled in")
    }

    /// Mirror the batch through an already-connected service.
    pub fn sync_with(&self, service: &dyn SheetService, batch: &Batch) -> SyncOutcome {
        match push(service, &self.config.names, batch) {
            Ok(rows) => {
                info!(
                    rows,
                    history = %self.config.names.history,
                    latest = %self.config.names.latest,
                    "pushed batch to spreadsheet"
                );
                SyncOutcome::Pushed { rows }
            }
            Err(e) => {
                error!(error = %e, "failed to push to spreadsheet");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }
}

fn skipped(reason: &str) -> SyncOutcome {
    info!("skipping spreadsheet mirror: {reason}");
    SyncOutcome::Skipped(reason.to_string())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn push(service: &dyn SheetService, names: &SheetNames, batch: &Batch) -> Result<usize, SheetError> {
    let cols = COLUMNS.len() as u32;
    let values = sheet_values(&batch.rows);

    if !service.sheet_exists(&names.history)? {
        service.add_sheet(&names.history, HISTORY_GRID_ROWS, cols)?;
        service.append_rows(&names.history, &[header_row()])?;
    }
    if !values.is_empty() {
        service.append_rows(&names.history, &values)?;
    }

    if service.sheet_exists(&names.latest)? {
        service.clear(&names.latest)?;
    } else {
        service.add_sheet(&names.latest, LATEST_GRID_ROWS, cols)?;
    }
    service.append_rows(&names.latest, &[header_row()])?;
    if !values.is_empty() {
        service.append_rows(&names.latest, &values)?;
    }

    Ok(values.len())
}

pub fn header_row() -> Vec<Value> {
    COLUMNS.iter().map(|c| Value::String(c.to_string())).collect()
}

/// Sheet-sanitize each row and convert it into cell values.
///
/// Absent numbers become empty-string cells.
pub fn sheet_values(rows: &[Row]) -> Vec<Vec<Value>> {
    rows.iter()
        .map(|row| {
            let row = sanitize_for_sheet(row);
            vec![
                Value::String(row.timestamp_utc),
                Value::String(row.category.label().to_string()),
                Value::String(row.name),
                Value::String(row.symbol),
                number_cell(row.value),
                number_cell(row.prev_close),
                number_cell(row.change_pct),
                Value::String(row.unit),
                Value::String(row.source),
            ]
        })
        .collect()
}

fn number_cell(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketsnap_core::Category;

    fn row(value: Option<f64>) -> Row {
        Row {
            timestamp_utc: "2024-05-01T00:00:00.000000+00:00".into(),
            category: Category::BondYield,
            name: "US 10Y Yield (DGS10)".into(),
            symbol: "DGS10".into(),
            value,
            prev_close: None,
            change_pct: None,
            unit: "%".into(),
            source: "fred".into(),
        }
    }

    #[test]
    fn absent_and_extreme_numbers_become_empty_cells() {
        let values = sheet_values(&[row(None), row(Some(1e200)), row(Some(f64::NAN))]);
        for cells in &values {
            assert_eq!(cells[4], Value::String(String::new()));
        }
    }

    #[test]
    fn finite_numbers_stay_numbers() {
        let values = sheet_values(&[row(Some(4.25))]);
        assert_eq!(values[0][4], serde_json::json!(4.25));
        assert_eq!(values[0][1], Value::String("BOND_YIELD".into()));
        assert_eq!(values[0].len(), COLUMNS.len());
    }

    #[test]
    fn missing_config_is_skipped() {
        let sync = SheetSynchronizer::new(MirrorConfig::default());
        let outcome = sync.sync(&Batch::empty("ts"));
        assert!(matches!(outcome, SyncOutcome::Skipped(_)));
        assert!(!outcome.is_success());
    }

    #[test]
    fn blank_spreadsheet_id_is_skipped() {
        let sync = SheetSynchronizer::new(MirrorConfig {
            credentials_json: Some("{}".into()),
            spreadsheet_id: Some("   ".into()),
            names: SheetNames::default(),
        });
        assert!(matches!(sync.sync(&Batch::empty("ts")), SyncOutcome::Skipped(_)));
    }

    #[cfg(feature = "sheets")]
    #[test]
    fn malformed_credentials_fail_without_panicking() {
        let sync = SheetSynchronizer::new(MirrorConfig {
            credentials_json: Some("not json".into()),
            spreadsheet_id: Some("sheet-id".into()),
            names: SheetNames::default(),
        });
        match sync.sync(&Batch::empty("ts")) {
            SyncOutcome::Failed(msg) => assert!(msg.contains("invalid credentials JSON")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
