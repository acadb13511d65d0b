//! Tracing-backed event sink — renders strategy events as log lines.

use tracing::{info, warn};

use pivotlab_core::events::{EventSink, StrategyEvent};

/// Renders every [`StrategyEvent`] through `tracing`. Position lifecycle
/// events log at info, signal bookkeeping at info, discarded levels at warn
/// so a quiet filter still surfaces them.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &StrategyEvent) {
        match event {
            StrategyEvent::PivotConfirmed { kind, price, bar_index } => {
                info!(kind = kind.as_str(), price, bar_index, "pivot confirmed");
            }
            StrategyEvent::LevelActivated { price } => {
                info!(price, "reentry level activated");
            }
            StrategyEvent::LevelDiscardedLate { price, guard_price } => {
                warn!(price, guard_price, "reentry level discarded as late");
            }
            StrategyEvent::PositionOpened { price, quantity, stop } => {
                info!(price, quantity, stop, "position opened");
            }
            StrategyEvent::TrailingActivated { profit_pct } => {
                info!(profit_pct, "trailing stop activated");
            }
            StrategyEvent::PositionClosed { price, reason, pnl_pct } => {
                info!(price, reason = reason.as_str(), pnl_pct, "position closed");
            }
        }
    }
}
