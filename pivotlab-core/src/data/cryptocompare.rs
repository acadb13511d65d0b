//! CryptoCompare candle provider.
//!
//! Fetches OHLCV candles from the min-api `data/v2/histo{minute,hour,day}`
//! endpoints. Handles the API's in-body error envelope, rate limiting with
//! exponential-backoff retries, and the circuit breaker. The final element
//! of every histo response is the candle still forming, so it is dropped —
//! `BarSource` implementations only yield closed bars.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{BarSource, DataError, Granularity, MarketQuery};
use crate::domain::Bar;

const BASE_URL: &str = "https://min-api.cryptocompare.com/data/v2";

/// CryptoCompare min-api response envelope.
#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data")]
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data", default)]
    candles: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(rename = "volumefrom")]
    volume_from: f64,
}

/// CryptoCompare data provider.
pub struct CryptoCompareProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl CryptoCompareProvider {
    pub fn new(api_key: Option<String>, breaker: Arc<CircuitBreaker>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            api_key,
            breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    fn endpoint(granularity: Granularity) -> &'static str {
        match granularity {
            Granularity::Minute => "histominute",
            Granularity::Hour => "histohour",
            Granularity::Day => "histoday",
        }
    }

    fn histo_url(&self, query: &MarketQuery) -> Result<String, DataError> {
        let api_key = self.api_key.as_deref().ok_or(DataError::MissingApiKey)?;
        let mut url = format!(
            "{BASE_URL}/{}?fsym={}&tsym={}&limit={}&api_key={api_key}",
            Self::endpoint(query.granularity),
            query.symbol,
            query.currency,
            query.limit,
        );
        if let Some(venue) = &query.venue {
            url.push_str("&e=");
            url.push_str(venue);
        }
        Ok(url)
    }

    /// Turn the raw candle array into closed bars: skip the zero-filled
    /// padding rows the API emits for empty periods, and drop the trailing
    /// still-forming candle.
    fn convert(mut candles: Vec<RawCandle>) -> Result<Vec<Bar>, DataError> {
        candles.pop();

        let mut bars = Vec::with_capacity(candles.len());
        for candle in candles {
            if candle.open == 0.0 && candle.high == 0.0 && candle.low == 0.0 && candle.close == 0.0
            {
                continue;
            }
            let timestamp = DateTime::from_timestamp(candle.time, 0).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {}", candle.time))
            })?;
            bars.push(Bar {
                timestamp,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume_from,
            });
        }
        Ok(bars)
    }

    fn fetch_with_retry(&self, query: &MarketQuery) -> Result<Vec<Bar>, DataError> {
        let url = self.histo_url(query)?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            if !self.breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        self.breaker.record_failure();
                        last_error = Some(DataError::Other(format!(
                            "HTTP {status} for {}",
                            query.pair()
                        )));
                        continue;
                    }

                    let envelope: HistoResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {}: {e}",
                            query.pair()
                        ))
                    })?;

                    if envelope.response == "Error" {
                        // In-body API errors (bad pair, exhausted key) are
                        // not transient; don't retry them.
                        self.breaker.record_failure();
                        return Err(DataError::ProviderRejected(envelope.message));
                    }

                    let data = envelope.data.ok_or_else(|| {
                        DataError::ResponseFormatChanged("success response without data".into())
                    })?;

                    let bars = Self::convert(data.candles)?;
                    self.breaker.record_success();
                    return Ok(bars);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl BarSource for CryptoCompareProvider {
    fn name(&self) -> &str {
        "cryptocompare"
    }

    fn fetch(&self, query: &MarketQuery) -> Result<Vec<Bar>, DataError> {
        self.fetch_with_retry(query)
    }

    fn is_available(&self) -> bool {
        self.breaker.is_allowed()
    }
}
