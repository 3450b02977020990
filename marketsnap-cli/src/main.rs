//! marketsnap CLI — one collection pass per invocation.
//!
//! Fetches the configured instruments and macro series, writes
//! `latest.csv` / `history.csv`, and mirrors to Google Sheets when
//! `GOOGLE_SHEETS_CREDENTIALS_JSON` and `GOOGLE_SHEETS_SPREADSHEET_ID` are set.
//! Exits non-zero only when the local stores cannot be written.

use anyhow::{Context, Result};
use clap::Parser;
use marketsnap_core::config::{DXY_ALT_SYMBOL, DXY_NAME};
use marketsnap_core::data::{FredProvider, YahooProvider};
use marketsnap_core::{CollectorConfig, SourceAdapter};
use marketsnap_runner::{MirrorConfig, Pipeline, SheetSynchronizer, Sources};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CREDENTIALS_ENV: &str = "GOOGLE_SHEETS_CREDENTIALS_JSON";
const SPREADSHEET_ENV: &str = "GOOGLE_SHEETS_SPREADSHEET_ID";

#[derive(Parser)]
#[command(
    name = "marketsnap",
    about = "Collect a point-in-time snapshot of indices, FX, commodities and US yields"
)]
struct Cli {
    /// Look up the US Dollar Index under its alternate symbol (^DXY).
    #[arg(long, default_value_t = false)]
    alt_dxy: bool,

    /// TOML config replacing the built-in instrument list and settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for latest.csv and history.csv.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not mirror to Google Sheets even if configured.
    #[arg(long, default_value_t = false)]
    no_sheets: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CollectorConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CollectorConfig::default(),
    };
    if cli.alt_dxy {
        config = config.with_symbol_override(DXY_NAME, DXY_ALT_SYMBOL);
    }
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }

    let sources = Sources {
        price: SourceAdapter::price(Arc::new(YahooProvider::new(
            config.throttle.price_delay(),
        )?)),
        macro_series: SourceAdapter::macro_series(Arc::new(FredProvider::new(
            config.throttle.macro_delay(),
        )?)),
    };

    let mirror_config = MirrorConfig {
        credentials_json: std::env::var(CREDENTIALS_ENV).ok(),
        spreadsheet_id: std::env::var(SPREADSHEET_ENV).ok(),
        names: config.sheets.clone(),
    };

    let mut pipeline = Pipeline::new(config, sources);
    if !cli.no_sheets {
        pipeline = pipeline.with_mirror(Box::new(SheetSynchronizer::new(mirror_config)));
    }

    let report = pipeline.run()?;

    if !report.summary.all_succeeded() {
        warn!(
            "{} of {} items failed: {}",
            report.summary.failed,
            report.summary.total,
            report
                .summary
                .failures
                .iter()
                .map(|(symbol, _)| symbol.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    info!(
        rows = report.batch.len(),
        failed = report.summary.failed,
        "completed"
    );

    Ok(())
}
