//! Record — one observation (or one failed fetch) for a configured item.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument family a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Equity indices, FX pairs, commodity futures.
    #[serde(rename = "INDEX/FX/COMMOD")]
    IndexFxCommodity,
    /// Government bond yields and spreads derived from them.
    #[serde(rename = "BOND_YIELD")]
    BondYield,
}

impl Category {
    /// Label written to the `category` column.
    pub fn label(&self) -> &'static str {
        match self {
            Category::IndexFxCommodity => "INDEX/FX/COMMOD",
            Category::BondYield => "BOND_YIELD",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of fetching a single item.
///
/// A failed item keeps its place in the batch; it just carries the cause
/// instead of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Observed {
        value: f64,
        prev_close: Option<f64>,
        change_pct: Option<f64>,
    },
    Failed {
        cause: String,
    },
}

/// One row-to-be: identity of the item plus its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub category: Category,
    pub name: String,
    pub symbol: String,
    pub unit: String,
    /// Tag of whatever produced the record (`yfinance`, `fred`, `calc`).
    pub provider: String,
    pub outcome: Outcome,
}

impl Record {
    pub fn observed(
        category: Category,
        name: impl Into<String>,
        symbol: impl Into<String>,
        unit: impl Into<String>,
        provider: impl Into<String>,
        value: f64,
        prev_close: Option<f64>,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            symbol: symbol.into(),
            unit: unit.into(),
            provider: provider.into(),
            outcome: Outcome::Observed {
                value,
                prev_close,
                change_pct: change_pct(value, prev_close),
            },
        }
    }

    pub fn failed(
        category: Category,
        name: impl Into<String>,
        symbol: impl Into<String>,
        unit: impl Into<String>,
        provider: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            symbol: symbol.into(),
            unit: unit.into(),
            provider: provider.into(),
            outcome: Outcome::Failed {
                cause: cause.into(),
            },
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Observed { value, .. } => Some(value),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn prev_close(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Observed { prev_close, .. } => prev_close,
            Outcome::Failed { .. } => None,
        }
    }

    pub fn change_pct(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Observed { change_pct, .. } => change_pct,
            Outcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// The `source` column: the provider tag, or `<provider>_error:<cause>`.
    pub fn source_tag(&self) -> String {
        match &self.outcome {
            Outcome::Observed { .. } => self.provider.clone(),
            Outcome::Failed { cause } => format!("{}_error:{cause}", self.provider),
        }
    }
}

/// Percentage change of `value` against `prev_close`.
///
/// `None` when there is no reference or the reference is zero.
pub fn change_pct(value: f64, prev_close: Option<f64>) -> Option<f64> {
    match prev_close {
        Some(prev) if prev != 0.0 => Some((value / prev - 1.0) * 100.0),
        _ => None,
    }
}
