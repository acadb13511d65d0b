//! PivotLab Core — swing-pivot reentry strategy engine.
//!
//! This crate contains the heart of the system:
//! - Domain types (bars, pivots, positions, trades)
//! - Windowed pivot scan with delayed confirmation
//! - High/low alternation gate and midpoint reentry level builder
//! - Single-position state machine (emergency stop + ratcheting trailing stop)
//! - Per-bar session processor with structured event emission
//! - Data boundary: source trait, CryptoCompare provider, rolling bar window

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod events;
pub mod signals;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types that cross the driver boundary are
    /// Send + Sync, so a live session can run on a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::OpenPosition>();
        require_sync::<domain::OpenPosition>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();

        require_send::<config::StrategyParams>();
        require_sync::<config::StrategyParams>();
        require_send::<config::AccountParams>();
        require_sync::<config::AccountParams>();

        require_send::<events::StrategyEvent>();
        require_sync::<events::StrategyEvent>();

        require_send::<engine::Session>();
        require_send::<data::MarketQuery>();
        require_sync::<data::MarketQuery>();
        require_send::<data::CryptoCompareProvider>();
        require_sync::<data::CryptoCompareProvider>();
    }
}
