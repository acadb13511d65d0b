//! Data boundary: source trait, CryptoCompare provider, rolling window,
//! synthetic generator.

pub mod circuit_breaker;
pub mod cryptocompare;
pub mod provider;
pub mod synthetic;
pub mod window;

pub use circuit_breaker::CircuitBreaker;
pub use cryptocompare::CryptoCompareProvider;
pub use provider::{BarSource, DataError, Granularity, MarketQuery};
pub use window::{BarWindow, MergeOutcome};
