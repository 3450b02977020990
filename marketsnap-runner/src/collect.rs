//! Fetch orchestration — runs the source adapters over the configured items.
//!
//! Items are fetched on a bounded Rayon pool when `concurrency > 1`. Pacing
//! lives in each adapter, so the request rate per provider is the same as a
//! sequential pass. Results come back in configured order regardless of which
//! call finishes first.

use anyhow::{Context, Result};
use marketsnap_core::config::Instrument;
use marketsnap_core::{compute_spreads, CollectorConfig, Record, SourceAdapter};
use rayon::prelude::*;

/// The two adapters a pass fetches through.
pub struct Sources {
    pub price: SourceAdapter,
    pub macro_series: SourceAdapter,
}

/// Fetch every item through `adapter`, one record per item, in item order.
pub fn collect_group(
    adapter: &SourceAdapter,
    items: &[Instrument],
    pool: Option<&rayon::ThreadPool>,
) -> Vec<Record> {
    match pool {
        Some(tp) => tp.install(|| {
            items
                .par_iter()
                .map(|item| adapter.fetch(&item.name, &item.symbol))
                .collect()
        }),
        None => items
            .iter()
            .map(|item| adapter.fetch(&item.name, &item.symbol))
            .collect(),
    }
}

/// Fetch all groups for one pass.
///
/// Returns `[price records, macro records + derived spreads]`.
pub fn collect_all(config: &CollectorConfig, sources: &Sources) -> Result<Vec<Vec<Record>>> {
    let thread_pool = if config.throttle.concurrency > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.throttle.concurrency)
                .build()
                .context("failed to build fetch thread pool")?,
        )
    } else {
        None
    };

    let prices = collect_group(&sources.price, &config.price_instruments, thread_pool.as_ref());
    let mut macros = collect_group(
        &sources.macro_series,
        &config.macro_series,
        thread_pool.as_ref(),
    );
    let spreads = compute_spreads(&macros, &config.spreads);
    macros.extend(spreads);

    Ok(vec![prices, macros])
}
