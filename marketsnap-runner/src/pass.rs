//! One collection pass: fetch → derive → assemble → persist → mirror.
//!
//! Fetch failures and mirror failures are absorbed into the report; only a
//! local persistence failure makes `run` return an error.

use anyhow::{Context, Result};
use marketsnap_core::{Batch, CollectorConfig, Outcome, Record};
use tracing::{info, warn};

use crate::aggregate::assemble;
use crate::collect::{collect_all, Sources};
use crate::sheets::{SheetSynchronizer, SyncOutcome};
use crate::store::CsvStore;

/// Something the persisted batch can be mirrored to.
pub trait Mirror {
    fn sync(&self, batch: &Batch) -> SyncOutcome;
}

impl Mirror for SheetSynchronizer {
    fn sync(&self, batch: &Batch) -> SyncOutcome {
        SheetSynchronizer::sync(self, batch)
    }
}

/// Per-pass counts, mirroring what was fetched before assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSummary {
    /// Configured items (derived spreads excluded).
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Derived records emitted.
    pub derived: usize,
    /// `(symbol, cause)` for every failed item.
    pub failures: Vec<(String, String)>,
}

impl PassSummary {
    fn from_groups(groups: &[Vec<Record>]) -> Self {
        let mut summary = Self::default();
        for record in groups.iter().flatten() {
            if record.provider == "calc" {
                summary.derived += 1;
                continue;
            }
            summary.total += 1;
            match &record.outcome {
                Outcome::Observed { .. } => summary.succeeded += 1,
                Outcome::Failed { cause } => {
                    summary.failed += 1;
                    summary.failures.push((record.symbol.clone(), cause.clone()));
                }
            }
        }
        summary
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone)]
pub struct PassReport {
    pub batch: Batch,
    pub summary: PassSummary,
    /// `None` when no mirror is configured or the batch was empty.
    pub sync: Option<SyncOutcome>,
}

pub struct Pipeline {
    config: CollectorConfig,
    sources: Sources,
    store: CsvStore,
    mirror: Option<Box<dyn Mirror>>,
}

impl Pipeline {
    /// Pipeline writing to the stores named in `config.output`.
    pub fn new(config: CollectorConfig, sources: Sources) -> Self {
        let store = CsvStore::from_config(&config.output);
        Self {
            config,
            sources,
            store,
            mirror: None,
        }
    }

    pub fn with_store(mut self, store: CsvStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_mirror(mut self, mirror: Box<dyn Mirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Run one pass.
    pub fn run(&self) -> Result<PassReport> {
        info!(
            prices = self.config.price_instruments.len(),
            macro_series = self.config.macro_series.len(),
            "starting market data fetch"
        );

        let groups = collect_all(&self.config, &self.sources)?;
        let summary = PassSummary::from_groups(&groups);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            total = summary.total,
            derived = summary.derived,
            "fetch complete"
        );

        let batch = assemble(groups);
        if batch.is_empty() {
            return Ok(PassReport {
                batch,
                summary,
                sync: None,
            });
        }

        self.store.persist(&batch).with_context(|| {
            format!(
                "failed to persist batch to {} / {}",
                self.store.latest_path().display(),
                self.store.history_path().display()
            )
        })?;
        info!(
            rows = batch.len(),
            latest = %self.store.latest_path().display(),
            history = %self.store.history_path().display(),
            "wrote latest snapshot and appended history"
        );

        let sync = self.mirror.as_ref().map(|m| m.sync(&batch));
        if let Some(SyncOutcome::Failed(msg)) = &sync {
            warn!("spreadsheet mirror failed, local stores are intact: {msg}");
        }

        Ok(PassReport {
            batch,
            summary,
            sync,
        })
    }
}
