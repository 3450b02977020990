//! Source adapters — turn provider series into records.
//!
//! An adapter never fails: whatever goes wrong inside the provider becomes a
//! `Failed` record for that one item, with the error text as its cause.
//! Request pacing belongs to the provider, since only it sees each retry.

use crate::data::{Observation, SeriesProvider, SourceError};
use crate::domain::{Category, Record};
use std::sync::Arc;
use tracing::{debug, warn};

/// Which record shape an adapter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// Latest close plus previous close and percent change.
    Price,
    /// Latest value only, in percent.
    MacroSeries,
}

impl AdapterKind {
    pub fn category(&self) -> Category {
        match self {
            AdapterKind::Price => Category::IndexFxCommodity,
            AdapterKind::MacroSeries => Category::BondYield,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            AdapterKind::Price => "",
            AdapterKind::MacroSeries => "%",
        }
    }
}

/// A provider plus the record shaping for one source.
pub struct SourceAdapter {
    kind: AdapterKind,
    provider: Arc<dyn SeriesProvider>,
}

impl SourceAdapter {
    pub fn new(kind: AdapterKind, provider: Arc<dyn SeriesProvider>) -> Self {
        Self { kind, provider }
    }

    pub fn price(provider: Arc<dyn SeriesProvider>) -> Self {
        Self::new(AdapterKind::Price, provider)
    }

    pub fn macro_series(provider: Arc<dyn SeriesProvider>) -> Self {
        Self::new(AdapterKind::MacroSeries, provider)
    }

    /// Fetch one item. Always returns exactly one record.
    pub fn fetch(&self, name: &str, symbol: &str) -> Record {
        let provider = self.provider.name();
        let category = self.kind.category();
        let unit = self.kind.unit();

        let latest = self
            .provider
            .fetch_recent(symbol)
            .and_then(|window| latest_two(symbol, window));

        match latest {
            Ok((latest, previous)) => {
                debug!(provider, symbol, value = latest.value, date = %latest.date, "fetched");
                let prev_close = match self.kind {
                    // A lone observation is its own reference: change is 0.
                    AdapterKind::Price => Some(previous.map_or(latest.value, |p| p.value)),
                    AdapterKind::MacroSeries => None,
                };
                Record::observed(category, name, symbol, unit, provider, latest.value, prev_close)
            }
            Err(e) => {
                warn!(provider, symbol, error = %e, "failed to fetch");
                Record::failed(category, name, symbol, unit, provider, e.to_string())
            }
        }
    }
}

/// The most recent valid observation and the one before it, by date.
///
/// Non-finite points are dropped first, so a hole in the window only costs
/// that point.
fn latest_two(
    symbol: &str,
    mut window: Vec<Observation>,
) -> Result<(Observation, Option<Observation>), SourceError> {
    window.retain(|o| o.value.is_finite());
    window.sort_by_key(|o| o.date);
    let latest = window.pop().ok_or_else(|| SourceError::NoData {
        symbol: symbol.to_string(),
    })?;
    Ok((latest, window.pop()))
}
