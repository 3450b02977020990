//! marketsnap runner — collection pass orchestration and persistence.
//!
//! This crate builds on `marketsnap-core` to provide:
//! - Bounded parallel fetching with deterministic ordering
//! - Batch assembly with a single collection timestamp
//! - Latest/history CSV stores
//! - Best-effort spreadsheet mirror

pub mod aggregate;
pub mod collect;
pub mod pass;
pub mod sheets;
pub mod store;

pub use aggregate::{assemble, assemble_at};
pub use collect::{collect_all, collect_group, Sources};
pub use pass::{Mirror, PassReport, PassSummary, Pipeline};
pub use sheets::{MirrorConfig, SheetError, SheetService, SheetSynchronizer, SyncOutcome};
pub use store::{CsvStore, PersistError};
