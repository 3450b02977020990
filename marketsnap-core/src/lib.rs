//! marketsnap core — records, providers, source adapters, spreads, sanitizer.
//!
//! This crate contains everything that happens before a batch is persisted:
//! - Domain types (records with a tagged outcome, export rows, batches)
//! - Provider trait with Yahoo Finance and FRED implementations
//! - Source adapters that never fail past their boundary
//! - Derived spread calculator
//! - Export sanitizer for files and spreadsheets
//! - Collector configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod sanitize;
pub mod source;
pub mod spread;

pub use config::{CollectorConfig, ConfigError, Instrument};
pub use domain::{Batch, Category, Outcome, Record, Row, COLUMNS};
pub use source::{AdapterKind, SourceAdapter};
pub use spread::{compute_spreads, SpreadDefinition};
