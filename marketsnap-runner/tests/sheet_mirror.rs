//! Spreadsheet mirror behavior against an in-memory sheet service.

use marketsnap_core::config::SheetNames;
use marketsnap_core::{Batch, Category, Row, COLUMNS};
use marketsnap_runner::{MirrorConfig, SheetError, SheetService, SheetSynchronizer, SyncOutcome};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
struct MemorySheets {
    sheets: RefCell<HashMap<String, Vec<Vec<Value>>>>,
    calls: RefCell<Vec<String>>,
    fail_on_append: bool,
}

impl MemorySheets {
    fn rows(&self, title: &str) -> Vec<Vec<Value>> {
        self.sheets.borrow().get(title).cloned().unwrap_or_default()
    }
}

impl SheetService for MemorySheets {
    fn sheet_exists(&self, title: &str) -> Result<bool, SheetError> {
        Ok(self.sheets.borrow().contains_key(title))
    }

    fn add_sheet(&self, title: &str, _rows: u32, cols: u32) -> Result<(), SheetError> {
        assert_eq!(cols as usize, COLUMNS.len());
        self.calls.borrow_mut().push(format!("add {title}"));
        self.sheets.borrow_mut().insert(title.to_string(), Vec::new());
        Ok(())
    }

    fn clear(&self, title: &str) -> Result<(), SheetError> {
        self.calls.borrow_mut().push(format!("clear {title}"));
        if let Some(rows) = self.sheets.borrow_mut().get_mut(title) {
            rows.clear();
        }
        Ok(())
    }

    fn append_rows(&self, title: &str, rows: &[Vec<Value>]) -> Result<(), SheetError> {
        if self.fail_on_append {
            return Err(SheetError::Http {
                status: 429,
                body: "quota exceeded".into(),
            });
        }
        self.sheets
            .borrow_mut()
            .get_mut(title)
            .ok_or_else(|| SheetError::Payload(format!("no sheet {title}")))?
            .extend(rows.iter().cloned());
        Ok(())
    }
}

fn batch(ts: &str, values: &[Option<f64>]) -> Batch {
    Batch {
        timestamp_utc: ts.into(),
        rows: values
            .iter()
            .enumerate()
            .map(|(i, v)| Row {
                timestamp_utc: ts.into(),
                category: Category::IndexFxCommodity,
                name: format!("item {i}"),
                symbol: format!("SYM{i}"),
                value: *v,
                prev_close: None,
                change_pct: None,
                unit: String::new(),
                source: "yfinance".into(),
            })
            .collect(),
    }
}

fn synchronizer() -> SheetSynchronizer {
    SheetSynchronizer::new(MirrorConfig {
        credentials_json: None,
        spreadsheet_id: None,
        names: SheetNames::default(),
    })
}

#[test]
fn first_sync_creates_both_sheets_with_headers() {
    let sheets = MemorySheets::default();
    let outcome = synchronizer().sync_with(&sheets, &batch("t1", &[Some(1.0), None]));

    assert_eq!(outcome, SyncOutcome::Pushed { rows: 2 });
    assert!(outcome.is_success());

    let history = sheets.rows("History");
    assert_eq!(history.len(), 3);
    assert_eq!(history[0][0], json!("timestamp_utc"));
    assert_eq!(history[1][4], json!(1.0));
    assert_eq!(history[2][4], json!(""));

    let latest = sheets.rows("Latest");
    assert_eq!(latest.len(), 3);
    assert_eq!(latest[0][8], json!("source"));
}

#[test]
fn second_sync_appends_history_and_rewrites_latest() {
    let sheets = MemorySheets::default();
    let sync = synchronizer();
    sync.sync_with(&sheets, &batch("t1", &[Some(1.0), Some(2.0)]));
    sync.sync_with(&sheets, &batch("t2", &[Some(3.0)]));

    let history = sheets.rows("History");
    // One header, then 2 + 1 rows.
    assert_eq!(history.len(), 4);
    assert_eq!(
        history.iter().filter(|r| r[0] == json!("timestamp_utc")).count(),
        1
    );

    let latest = sheets.rows("Latest");
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[1][0], json!("t2"));

    let calls = sheets.calls.borrow();
    assert_eq!(
        *calls,
        vec![
            "add History".to_string(),
            "add Latest".to_string(),
            "clear Latest".to_string(),
        ]
    );
}

#[test]
fn huge_magnitudes_become_empty_cells() {
    let sheets = MemorySheets::default();
    synchronizer().sync_with(&sheets, &batch("t1", &[Some(1e101), Some(-1e300)]));
    let latest = sheets.rows("Latest");
    assert_eq!(latest[1][4], json!(""));
    assert_eq!(latest[2][4], json!(""));
}

#[test]
fn remote_error_becomes_failed_outcome() {
    let sheets = MemorySheets {
        fail_on_append: true,
        ..MemorySheets::default()
    };
    let outcome = synchronizer().sync_with(&sheets, &batch("t1", &[Some(1.0)]));
    match outcome {
        SyncOutcome::Failed(msg) => assert!(msg.contains("429")),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn unconfigured_mirror_is_skipped() {
    let outcome = synchronizer().sync(&batch("t1", &[Some(1.0)]));
    assert!(matches!(outcome, SyncOutcome::Skipped(_)));
    assert!(!outcome.is_success());
}

#[test]
fn custom_sheet_names_are_used() {
    let sheets = MemorySheets::default();
    let sync = SheetSynchronizer::new(MirrorConfig {
        credentials_json: None,
        spreadsheet_id: None,
        names: SheetNames {
            history: "Log".into(),
            latest: "Now".into(),
        },
    });
    sync.sync_with(&sheets, &batch("t1", &[Some(1.0)]));
    assert_eq!(sheets.rows("Log").len(), 2);
    assert_eq!(sheets.rows("Now").len(), 2);
    assert!(sheets.rows("History").is_empty());
}
