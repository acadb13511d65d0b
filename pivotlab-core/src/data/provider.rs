//! Bar source trait and structured error types.
//!
//! The `BarSource` trait abstracts over candle providers (CryptoCompare,
//! CSV import, synthetic data) so the drivers can swap implementations and
//! the tests can mock the boundary. Sources only ever yield *closed* bars.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Candle granularity; maps one-to-one onto the provider's histo endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minute,
    Hour,
    Day,
}

impl Granularity {
    pub fn seconds(&self) -> i64 {
        match self {
            Granularity::Minute => 60,
            Granularity::Hour => 3_600,
            Granularity::Day => 86_400,
        }
    }
}

/// What to fetch: one instrument on one venue at one granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuery {
    /// Base asset symbol, e.g. "BTC".
    pub symbol: String,
    /// Quote currency, e.g. "USDT".
    pub currency: String,
    /// Specific exchange, or `None` for the provider's aggregate feed.
    pub venue: Option<String>,
    pub granularity: Granularity,
    /// Maximum number of closed bars to return.
    pub limit: usize,
}

impl MarketQuery {
    /// Display pair, e.g. "BTC-USDT".
    pub fn pair(&self) -> String {
        format!("{}-{}", self.symbol, self.currency)
    }

    /// The same query with a different bar budget (used by the live
    /// driver's small tail polls).
    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }
}

/// Structured error types for candle fetching.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("api key missing — set market.api_key in the run config")]
    MissingApiKey,

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for candle providers.
///
/// An empty result is a valid "no new data" signal, not an error.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch up to `query.limit` closed bars, ordered ascending by
    /// timestamp.
    fn fetch(&self, query: &MarketQuery) -> Result<Vec<Bar>, DataError>;

    /// Whether the source is currently usable (not rate-limited or blocked).
    fn is_available(&self) -> bool {
        true
    }
}
