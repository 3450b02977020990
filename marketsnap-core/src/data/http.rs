//! Blocking HTTP GET with retry and status classification, shared by the
//! Yahoo and FRED providers.
//!
//! Every attempt, first or retried, takes a slot from the provider's pacer.

use super::pacer::Pacer;
use super::provider::SourceError;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Retry policy for one provider.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound on any single backoff, including a server's Retry-After.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based) after `error`.
    ///
    /// Exponential from `base_delay`, raised to the server's Retry-After on a
    /// 429, and capped at `max_delay`.
    pub fn backoff(&self, retry: u32, error: &SourceError) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)));
        let delay = match error {
            SourceError::RateLimited { retry_after_secs } => {
                exponential.max(Duration::from_secs(*retry_after_secs))
            }
            _ => exponential,
        };
        delay.min(self.max_delay)
    }
}

/// Outcome of a single attempt that did not succeed.
#[derive(Debug)]
pub enum AttemptError {
    /// Worth another attempt after backing off.
    Transient(SourceError),
    /// Give up now.
    Fatal(SourceError),
}

pub fn build_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SourceError::Client(e.to_string()))
}

/// GET `url`, retrying transient failures with backoff.
///
/// 403, 401 and other 4xx fail immediately; 404 maps to `SymbolNotFound`;
/// 429, 5xx and connect/timeout errors are retried.
pub fn get_with_retry(
    client: &Client,
    url: &str,
    symbol: &str,
    policy: RetryPolicy,
    pacer: &Pacer,
) -> Result<Response, SourceError> {
    with_retry(policy, pacer, || send_once(client, url, symbol))
}

/// Run `attempt` until it succeeds, fails fatally, or retries run out.
///
/// `pacer.wait()` runs before every attempt, so retries count against the
/// provider's request rate like any other request.
pub fn with_retry<T>(
    policy: RetryPolicy,
    pacer: &Pacer,
    mut attempt: impl FnMut() -> Result<T, AttemptError>,
) -> Result<T, SourceError> {
    let mut retry = 0;
    loop {
        pacer.wait();
        match attempt() {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(e)) => return Err(e),
            Err(AttemptError::Transient(e)) => {
                if retry >= policy.max_retries {
                    return Err(e);
                }
                retry += 1;
                std::thread::sleep(policy.backoff(retry, &e));
            }
        }
    }
}

fn send_once(client: &Client, url: &str, symbol: &str) -> Result<Response, AttemptError> {
    match client.get(url).send() {
        Ok(resp) => {
            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            match classify_status(status, symbol, retry_after) {
                (error, true) => Err(AttemptError::Transient(error)),
                (error, false) => Err(AttemptError::Fatal(error)),
            }
        }
        Err(e) if e.is_connect() || e.is_timeout() => Err(AttemptError::Transient(
            SourceError::NetworkUnreachable(e.to_string()),
        )),
        Err(e) => Err(AttemptError::Fatal(SourceError::NetworkUnreachable(
            e.to_string(),
        ))),
    }
}

/// Map a non-success status to an error and whether it is worth retrying.
fn classify_status(status: StatusCode, symbol: &str, retry_after: Option<u64>) -> (SourceError, bool) {
    match status {
        StatusCode::FORBIDDEN => (SourceError::Blocked(format!("HTTP 403 for {symbol}")), false),
        StatusCode::UNAUTHORIZED => (
            SourceError::AuthenticationRequired(format!("HTTP 401 for {symbol}")),
            false,
        ),
        StatusCode::NOT_FOUND => (
            SourceError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            false,
        ),
        StatusCode::TOO_MANY_REQUESTS => (
            SourceError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(60),
            },
            true,
        ),
        s if s.is_server_error() => (SourceError::Other(format!("HTTP {s} for {symbol}")), true),
        s => (SourceError::Other(format!("HTTP {s} for {symbol}")), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn client_errors_fail_fast() {
        let (err, retry) = classify_status(StatusCode::FORBIDDEN, "^GSPC", None);
        assert!(!retry);
        assert!(matches!(err, SourceError::Blocked(_)));

        let (err, retry) = classify_status(StatusCode::NOT_FOUND, "NOPE", None);
        assert!(!retry);
        assert!(matches!(err, SourceError::SymbolNotFound { symbol } if symbol == "NOPE"));

        let (_, retry) = classify_status(StatusCode::BAD_REQUEST, "^GSPC", None);
        assert!(!retry);
    }

    #[test]
    fn rate_limit_and_server_errors_retry() {
        let (err, retry) = classify_status(StatusCode::TOO_MANY_REQUESTS, "^GSPC", Some(5));
        assert!(retry);
        assert!(matches!(err, SourceError::RateLimited { retry_after_secs: 5 }));

        let (err, _) = classify_status(StatusCode::TOO_MANY_REQUESTS, "^GSPC", None);
        assert!(matches!(err, SourceError::RateLimited { retry_after_secs: 60 }));

        let (err, retry) = classify_status(StatusCode::BAD_GATEWAY, "DGS10", None);
        assert!(retry);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn backoff_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
    }

    fn quick_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn unavailable() -> AttemptError {
        AttemptError::Transient(SourceError::Other("HTTP 503 for DGS10".into()))
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        let err = SourceError::Other("HTTP 503".into());
        assert_eq!(policy.backoff(1, &err), Duration::from_millis(500));
        assert_eq!(policy.backoff(2, &err), Duration::from_secs(1));
        assert_eq!(policy.backoff(3, &err), Duration::from_secs(2));
        assert_eq!(policy.backoff(20, &err), Duration::from_secs(30));
    }

    #[test]
    fn backoff_honors_retry_after_up_to_cap() {
        let policy = RetryPolicy::default();
        let limited = |secs| SourceError::RateLimited {
            retry_after_secs: secs,
        };
        assert_eq!(policy.backoff(1, &limited(7)), Duration::from_secs(7));
        assert_eq!(policy.backoff(1, &limited(0)), Duration::from_millis(500));
        assert_eq!(policy.backoff(1, &limited(3600)), Duration::from_secs(30));
    }

    #[test]
    fn transient_failures_retry_until_success() {
        let mut calls = 0;
        let result = with_retry(quick_policy(3), &Pacer::new(Duration::ZERO), || {
            calls += 1;
            if calls < 3 {
                Err(unavailable())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn fatal_failure_stops_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = with_retry(quick_policy(3), &Pacer::new(Duration::ZERO), || {
            calls += 1;
            Err(AttemptError::Fatal(SourceError::Blocked("HTTP 403".into())))
        });
        assert!(matches!(result, Err(SourceError::Blocked(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn exhausted_retries_return_last_error() {
        let mut calls = 0;
        let result: Result<(), _> = with_retry(quick_policy(2), &Pacer::new(Duration::ZERO), || {
            calls += 1;
            Err(unavailable())
        });
        assert!(result.unwrap_err().to_string().contains("503"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn every_attempt_takes_a_pacer_slot() {
        // Backoff is ~1ms, so only the pacer can stretch four attempts to
        // three full intervals.
        let pacer = Pacer::new(Duration::from_millis(40));
        let t0 = Instant::now();
        let result: Result<(), _> = with_retry(quick_policy(3), &pacer, || Err(unavailable()));
        assert!(result.is_err());
        assert!(t0.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn retries_share_the_pacer_with_other_callers() {
        let pacer = std::sync::Arc::new(Pacer::new(Duration::from_millis(25)));
        let starts = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let t0 = Instant::now();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let pacer = pacer.clone();
                let starts = starts.clone();
                std::thread::spawn(move || {
                    let _: Result<(), _> = with_retry(quick_policy(1), &pacer, || {
                        starts.lock().unwrap().push(Instant::now());
                        Err(unavailable())
                    });
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 6);
        // Six starts from one pacer need five full intervals, retries included.
        let last = starts.iter().max().copied().unwrap();
        assert!(last - t0 >= Duration::from_millis(125));
    }
}
