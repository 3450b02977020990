//! Derived spreads between two fetched series.

use crate::domain::{Category, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// `round((long - short) * multiplier, 1)`, emitted as a `calc` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadDefinition {
    pub name: String,
    pub symbol: String,
    /// Provider symbol of the minuend series.
    pub long: String,
    /// Provider symbol of the subtrahend series.
    pub short: String,
    /// Percentage points to basis points is 100.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    100.0
}

impl SpreadDefinition {
    pub fn us_10y_2y() -> Self {
        Self {
            name: "US 10Y-2Y Spread".into(),
            symbol: "SPREAD_10Y_2Y".into(),
            long: "DGS10".into(),
            short: "DGS2".into(),
            multiplier: default_multiplier(),
        }
    }
}

/// Compute every spread whose inputs both have a value in `records`.
///
/// Inputs are looked up by symbol. A definition with a missing or failed
/// input, or whose result overflows to a non-finite number, is skipped.
pub fn compute_spreads(records: &[Record], definitions: &[SpreadDefinition]) -> Vec<Record> {
    let by_symbol: HashMap<&str, &Record> =
        records.iter().map(|r| (r.symbol.as_str(), r)).collect();

    definitions
        .iter()
        .filter_map(|def| {
            let long = by_symbol.get(def.long.as_str()).and_then(|r| r.value());
            let short = by_symbol.get(def.short.as_str()).and_then(|r| r.value());
            let (Some(long), Some(short)) = (long, short) else {
                debug!(spread = %def.symbol, "inputs unavailable, spread skipped");
                return None;
            };
            let value = round1((long - short) * def.multiplier);
            if !value.is_finite() {
                debug!(spread = %def.symbol, long, short, "spread not finite, skipped");
                return None;
            }
            Some(Record::observed(
                Category::BondYield,
                def.name.as_str(),
                def.symbol.as_str(),
                "bp",
                "calc",
                value,
                None,
            ))
        })
        .collect()
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
