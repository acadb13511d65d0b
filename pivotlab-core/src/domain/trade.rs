//! TradeRecord — a completed round-trip trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which stop closed the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// The ratcheting trailing stop.
    TrailingStop,
    /// The fixed stop set at entry.
    EmergencyStop,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TrailingStop => "Trailing Stop",
            ExitReason::EmergencyStop => "Emergency SL",
        }
    }
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    pub exit_bar: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    /// Asset units held for the duration of the trade.
    pub quantity: f64,

    /// (exit - entry) * quantity, before costs.
    pub gross_pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub net_pnl: f64,
    /// Price return in percent, measured entry close to exit fill.
    pub pnl_pct: f64,

    pub exit_reason: ExitReason,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }
}
