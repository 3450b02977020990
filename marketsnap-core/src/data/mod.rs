//! Data providers and request pacing

pub mod fred;
pub mod http;
pub mod pacer;
pub mod provider;
pub mod yahoo;

pub use fred::FredProvider;
pub use http::RetryPolicy;
pub use pacer::Pacer;
pub use provider::{Observation, SeriesProvider, SourceError};
pub use yahoo::YahooProvider;
