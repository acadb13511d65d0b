//! Serializable run configuration (TOML) with load-time validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use pivotlab_core::config::{AccountParams, ConfigError, StrategyParams};
use pivotlab_core::data::{Granularity, MarketQuery};

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

/// Everything one session needs, loaded once before any bar is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub market: MarketConfig,
    #[serde(default)]
    pub strategy: StrategyParams,
    #[serde(default)]
    pub account: AccountParams,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Which instrument to watch and where the candles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Base asset symbol, e.g. "BTC".
    pub symbol: String,
    /// Quote currency, e.g. "USDT".
    pub currency: String,
    /// Specific exchange, or `None` for the aggregate feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
    /// Closed bars fetched for the initial history replay.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// CryptoCompare API key. Only needed for network runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_granularity() -> Granularity {
    Granularity::Hour
}

fn default_history_limit() -> usize {
    2_000
}

/// Live-loop pacing and memory bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub poll_interval_secs: u64,
    /// Rolling window bound for live sessions; `None` keeps everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_capacity: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            window_capacity: None,
        }
    }
}

/// Why a run configuration could not be loaded.
#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),

    #[error("market.symbol and market.currency must be non-empty")]
    EmptyPair,

    #[error("runtime.poll_interval_secs must be at least 1")]
    ZeroPollInterval,

    #[error("market.history_limit must cover the pivot lookback ({min} bars), got {got}")]
    HistoryTooShort { min: usize, got: usize },
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, RunConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        self.strategy.validate()?;
        self.account.validate()?;
        if self.market.symbol.trim().is_empty() || self.market.currency.trim().is_empty() {
            return Err(RunConfigError::EmptyPair);
        }
        if self.runtime.poll_interval_secs == 0 {
            return Err(RunConfigError::ZeroPollInterval);
        }
        let min = self.strategy.min_lookback();
        if self.market.history_limit < min {
            return Err(RunConfigError::HistoryTooShort {
                min,
                got: self.market.history_limit,
            });
        }
        Ok(())
    }

    /// Deterministic content hash of this configuration. Two identical
    /// configs share a run id, which makes result files comparable.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn market_query(&self) -> MarketQuery {
        MarketQuery {
            symbol: self.market.symbol.clone(),
            currency: self.market.currency.clone(),
            venue: self.market.venue.clone(),
            granularity: self.market.granularity,
            limit: self.market.history_limit,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            market: MarketConfig {
                symbol: "BTC".into(),
                currency: "USDT".into(),
                venue: None,
                granularity: default_granularity(),
                history_limit: default_history_limit(),
                api_key: None,
            },
            strategy: StrategyParams::default(),
            account: AccountParams::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}
