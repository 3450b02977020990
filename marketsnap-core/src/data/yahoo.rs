//! Yahoo Finance price provider.
//!
//! Reads the last few daily closes from Yahoo's v8 chart API. Yahoo has no
//! official API and changes its payload without notice, so every missing
//! piece of the response is reported as `ResponseFormatChanged` instead of
//! panicking.

use super::http::{build_client, get_with_retry, RetryPolicy};
use super::pacer::Pacer;
use super::provider::{Observation, SeriesProvider, SourceError};
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance provider, tagged `yfinance` in the output.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
    pacer: Pacer,
    range: String,
}

impl YahooProvider {
    /// Provider with a five-day daily window, so one missing session still
    /// leaves a previous close to compare against.
    ///
    /// Request starts, retries included, are spaced at least `min_interval`
    /// apart across every thread using this provider.
    pub fn new(min_interval: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            retry: RetryPolicy::default(),
            pacer: Pacer::new(min_interval),
            range: "5d".to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{}?range={}&interval=1d",
            urlencoding::encode(symbol),
            self.range
        )
    }

    /// Parse a chart API payload into dated closes.
    ///
    /// Sessions with a null close (holidays, partial data) are skipped.
    pub fn parse_chart(symbol: &str, body: &str) -> Result<Vec<Observation>, SourceError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            SourceError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => SourceError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                SourceError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => SourceError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::ResponseFormatChanged("result array is empty".into()))?;

        // A symbol with no sessions in range comes back without timestamps.
        let timestamps = data.timestamp.unwrap_or_default();

        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut observations = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    SourceError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            if let Some(close) = closes.get(i).copied().flatten() {
                observations.push(Observation::new(date, close));
            }
        }

        Ok(observations)
    }
}

impl SeriesProvider for YahooProvider {
    fn name(&self) -> &str {
        "yfinance"
    }

    fn fetch_recent(&self, symbol: &str) -> Result<Vec<Observation>, SourceError> {
        let url = self.chart_url(symbol);
        let resp = get_with_retry(&self.client, &url, symbol, self.retry, &self.pacer)?;
        let body = resp
            .text()
            .map_err(|e| SourceError::NetworkUnreachable(e.to_string()))?;
        Self::parse_chart(symbol, &body)
    }
}
