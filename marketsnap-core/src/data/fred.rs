//! FRED macro-series provider.
//!
//! Uses the public `fredgraph.csv` download (no API key). The CSV has a date
//! column and one value column; missing observations are written as `.`.

use super::http::{build_client, get_with_retry, RetryPolicy};
use super::pacer::Pacer;
use super::provider::{Observation, SeriesProvider, SourceError};
use chrono::NaiveDate;
use std::time::Duration;

/// FRED provider, tagged `fred` in the output.
pub struct FredProvider {
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
    pacer: Pacer,
    lookback_days: i64,
}

impl FredProvider {
    /// Provider spacing request starts, retries included, at least
    /// `min_interval` apart.
    pub fn new(min_interval: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            retry: RetryPolicy::default(),
            pacer: Pacer::new(min_interval),
            lookback_days: 30,
        })
    }

    fn series_url(&self, code: &str) -> String {
        let start = chrono::Utc::now().date_naive() - chrono::Duration::days(self.lookback_days);
        format!(
            "https://fred.stlouisfed.org/graph/fredgraph.csv?id={}&cosd={}",
            urlencoding::encode(code),
            start.format("%Y-%m-%d")
        )
    }

    /// Parse a `fredgraph.csv` body. Rows whose value is `.` or empty are
    /// skipped; a malformed date or number is a format change.
    pub fn parse_csv(code: &str, body: &str) -> Result<Vec<Observation>, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| SourceError::ResponseFormatChanged(format!("{code}: {e}")))?;
        if headers.len() < 2 {
            return Err(SourceError::ResponseFormatChanged(format!(
                "{code}: expected date and value columns, got {}",
                headers.len()
            )));
        }

        let mut observations = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| SourceError::ResponseFormatChanged(format!("{code}: {e}")))?;
            let (Some(date_field), Some(value_field)) = (record.get(0), record.get(1)) else {
                continue;
            };

            if value_field.is_empty() || value_field == "." {
                continue;
            }

            let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|e| {
                SourceError::ResponseFormatChanged(format!("{code}: bad date '{date_field}': {e}"))
            })?;
            let value: f64 = value_field.parse().map_err(|e| {
                SourceError::ResponseFormatChanged(format!(
                    "{code}: bad value '{value_field}': {e}"
                ))
            })?;

            observations.push(Observation::new(date, value));
        }

        Ok(observations)
    }
}

impl SeriesProvider for FredProvider {
    fn name(&self) -> &str {
        "fred"
    }

    fn fetch_recent(&self, code: &str) -> Result<Vec<Observation>, SourceError> {
        let url = self.series_url(code);
        let resp = get_with_retry(&self.client, &url, code, self.retry, &self.pacer)?;
        let body = resp
            .text()
            .map_err(|e| SourceError::NetworkUnreachable(e.to_string()))?;
        Self::parse_csv(code, &body)
    }
}
