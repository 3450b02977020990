//! Collector configuration.
//!
//! The built-in defaults reproduce the standard instrument list; a TOML file
//! can replace any section. Credentials are not part of this struct; the
//! binary resolves them from the environment and hands them to the mirror.

use crate::spread::SpreadDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Name of the instrument whose symbol `--alt-dxy` swaps.
pub const DXY_NAME: &str = "US Dollar Index (DXY)";

/// Alternate lookup key for the dollar index.
pub const DXY_ALT_SYMBOL: &str = "^DXY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate item name '{0}'")]
    DuplicateName(String),

    #[error("duplicate macro series symbol '{0}'")]
    DuplicateSymbol(String),

    #[error("spread '{spread}' refers to unconfigured macro series '{symbol}'")]
    UnknownSpreadInput { spread: String, symbol: String },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// One configured item: display name and provider lookup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub symbol: String,
}

impl Instrument {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// Where the local stores live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub latest_file: String,
    pub history_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            latest_file: "latest.csv".into(),
            history_file: "history.csv".into(),
        }
    }
}

impl OutputConfig {
    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(&self.latest_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(&self.history_file)
    }
}

/// Request pacing and fetch parallelism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum spacing between price requests, in milliseconds.
    pub price_delay_ms: u64,
    /// Minimum spacing between macro-series requests, in milliseconds.
    pub macro_delay_ms: u64,
    /// Worker threads used for fetching.
    pub concurrency: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            price_delay_ms: 200,
            macro_delay_ms: 100,
            concurrency: 4,
        }
    }
}

impl ThrottleConfig {
    pub fn price_delay(&self) -> Duration {
        Duration::from_millis(self.price_delay_ms)
    }

    pub fn macro_delay(&self) -> Duration {
        Duration::from_millis(self.macro_delay_ms)
    }
}

/// Target sheet names inside the mirrored spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub history: String,
    pub latest: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            history: "History".into(),
            latest: "Latest".into(),
        }
    }
}

/// Complete configuration for one collection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub price_instruments: Vec<Instrument>,
    pub macro_series: Vec<Instrument>,
    pub spreads: Vec<SpreadDefinition>,
    pub output: OutputConfig,
    pub throttle: ThrottleConfig,
    pub sheets: SheetNames,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        let price_instruments = [
            ("S&P 500", "^GSPC"),
            ("Dow Jones", "^DJI"),
            ("Nasdaq Composite", "^IXIC"),
            ("Euro Stoxx 50", "^STOXX50E"),
            ("Stoxx Europe 600", "^STOXX"),
            (DXY_NAME, "DX-Y.NYB"),
            ("EUR/USD", "EURUSD=X"),
            ("USD/JPY", "JPY=X"),
            ("GBP/USD", "GBPUSD=X"),
            ("USD/CHF", "CHF=X"),
            ("AUD/USD", "AUDUSD=X"),
            ("USD/CAD", "CAD=X"),
            ("NZD/USD", "NZDUSD=X"),
            ("WTI Crude (CL)", "CL=F"),
            ("Brent Crude (BZ)", "BZ=F"),
            ("Gold (GC)", "GC=F"),
            ("Copper (HG)", "HG=F"),
        ]
        .into_iter()
        .map(|(n, s)| Instrument::new(n, s))
        .collect();

        let macro_series = vec![
            Instrument::new("US 10Y Yield (DGS10)", "DGS10"),
            Instrument::new("US 2Y  Yield (DGS2)", "DGS2"),
        ];

        Self {
            price_instruments,
            macro_series,
            spreads: vec![SpreadDefinition::us_10y_2y()],
            output: OutputConfig::default(),
            throttle: ThrottleConfig::default(),
            sheets: SheetNames::default(),
        }
    }
}

impl CollectorConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string. Missing sections fall
    /// back to the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for item in self.price_instruments.iter().chain(&self.macro_series) {
            if !names.insert(item.name.as_str()) {
                return Err(ConfigError::DuplicateName(item.name.clone()));
            }
        }
        // Spread inputs are looked up by symbol, so each must be unambiguous.
        let mut symbols = HashSet::new();
        for item in &self.macro_series {
            if !symbols.insert(item.symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(item.symbol.clone()));
            }
        }
        for spread in &self.spreads {
            if !names.insert(spread.name.as_str()) {
                return Err(ConfigError::DuplicateName(spread.name.clone()));
            }
            for input in [&spread.long, &spread.short] {
                if !self.macro_series.iter().any(|m| &m.symbol == input) {
                    return Err(ConfigError::UnknownSpreadInput {
                        spread: spread.name.clone(),
                        symbol: input.clone(),
                    });
                }
            }
        }
        if self.throttle.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    /// Swap the lookup symbol of one named item, keeping its position.
    ///
    /// An unknown name leaves the config unchanged and logs a warning.
    pub fn with_symbol_override(mut self, name: &str, symbol: &str) -> Self {
        match self
            .price_instruments
            .iter_mut()
            .chain(self.macro_series.iter_mut())
            .find(|i| i.name == name)
        {
            Some(item) => item.symbol = symbol.to_string(),
            None => warn!(name, symbol, "no configured item to override, keeping config as is"),
        }
        self
    }

    /// Items fetched per pass, not counting derived spreads.
    pub fn item_count(&self) -> usize {
        self.price_instruments.len() + self.macro_series.len()
    }
}
