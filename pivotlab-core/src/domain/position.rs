//! OpenPosition — the single live long position and its stop arbitration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trade::ExitReason;

/// The one open long position a session may hold.
///
/// The emergency stop is fixed at entry and never recomputed. The trailing
/// stop only exists after activation and only ever moves up (the engine
/// enforces the ratchet in [`crate::engine::position::PositionBook`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_price: f64,
    /// Asset units held.
    pub quantity: f64,
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    /// Commission charged when the position was opened, carried into the
    /// trade record at exit.
    pub entry_commission: f64,

    pub highest_price_since_entry: f64,
    pub trailing_active: bool,
    pub trailing_stop: Option<f64>,
    pub emergency_stop: f64,
}

impl OpenPosition {
    /// Open a long at `entry_price`, with the emergency stop placed
    /// `emergency_sl_pct` percent below it.
    pub fn open_long(
        entry_price: f64,
        quantity: f64,
        entry_bar: usize,
        entry_time: DateTime<Utc>,
        entry_commission: f64,
        emergency_sl_pct: f64,
    ) -> Self {
        Self {
            entry_price,
            quantity,
            entry_bar,
            entry_time,
            entry_commission,
            highest_price_since_entry: entry_price,
            trailing_active: false,
            trailing_stop: None,
            emergency_stop: entry_price * (1.0 - emergency_sl_pct / 100.0),
        }
    }

    /// Unrealized favorable excursion in percent, measured from entry to the
    /// high watermark. A zero entry price yields zero, never a division error.
    pub fn profit_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (self.highest_price_since_entry - self.entry_price) / self.entry_price * 100.0
    }

    /// The stop that currently protects the position.
    ///
    /// Defaults to the emergency stop; once trailing is active its level wins
    /// whenever it sits above the emergency stop.
    pub fn effective_stop(&self) -> (f64, ExitReason) {
        match self.trailing_stop {
            Some(ts) if self.trailing_active && ts > self.emergency_stop => {
                (ts, ExitReason::TrailingStop)
            }
            _ => (self.emergency_stop, ExitReason::EmergencyStop),
        }
    }
}
