//! Series provider trait and structured error types.
//!
//! A provider answers one question: "give me the recent history of symbol X".
//! Everything above it (record shaping, error capture, pacing) lives in the
//! source adapters, so providers can be swapped for fakes in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One dated point of a provider time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Structured error types for a single provider request.
///
/// The `Display` text ends up in the `source` column of failed rows, so keep
/// messages short and single-line.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("blocked by provider: {0}")]
    Blocked(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("http client error: {0}")]
    Client(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Capability: fetch a short recent window of a time series.
///
/// Implementations return observations in whatever order the upstream gives
/// them; callers must not assume sorting.
pub trait SeriesProvider: Send + Sync {
    /// Tag written to the `source` column (`yfinance`, `fred`, ...).
    fn name(&self) -> &str;

    /// Fetch the recent observations for `symbol`.
    fn fetch_recent(&self, symbol: &str) -> Result<Vec<Observation>, SourceError>;
}
