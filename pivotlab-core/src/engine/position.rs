//! Position state machine: Flat ⇄ Open, with trailing activation, the
//! ratchet invariant, dual-stop arbitration, and gap-aware exit pricing.

use chrono::{DateTime, Utc};

use crate::config::StrategyParams;
use crate::domain::{Bar, ExitReason, OpenPosition};

/// The position closed by a stop on this bar.
#[derive(Debug, Clone, Copy)]
pub struct ExitFill {
    /// The position as it stood when the stop hit.
    pub position: OpenPosition,
    pub price: f64,
    pub reason: ExitReason,
    pub pnl_pct: f64,
}

/// What the per-bar risk update did.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskUpdate {
    /// Set (to the profit percent at activation) on the bar the trailing
    /// stop armed.
    pub trailing_activated: Option<f64>,
    pub exit: Option<ExitFill>,
}

/// Owns the zero-or-one open position. States are `Flat` and `Open`; there
/// is no scaling, netting, or partial exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionBook {
    open: Option<OpenPosition>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        self.open.as_ref()
    }

    /// Flat → Open. Callers check `is_open()` first; opening over an
    /// existing position is a logic error.
    pub fn open_long(
        &mut self,
        entry_price: f64,
        quantity: f64,
        entry_bar: usize,
        entry_time: DateTime<Utc>,
        entry_commission: f64,
        params: &StrategyParams,
    ) -> OpenPosition {
        debug_assert!(self.open.is_none(), "position book already holds a position");
        let position = OpenPosition::open_long(
            entry_price,
            quantity,
            entry_bar,
            entry_time,
            entry_commission,
            params.emergency_sl_pct,
        );
        self.open = Some(position);
        position
    }

    /// Per-bar risk update while open. Runs the fixed sequence: watermark,
    /// trailing activation, ratchet, stop arbitration, exit test.
    pub fn update(&mut self, bar: &Bar, params: &StrategyParams) -> RiskUpdate {
        let mut update = RiskUpdate::default();
        let Some(pos) = self.open.as_mut() else {
            return update;
        };

        pos.highest_price_since_entry = pos.highest_price_since_entry.max(bar.high);

        if !pos.trailing_active {
            let profit = pos.profit_pct();
            if profit >= params.profit_activation_pct {
                pos.trailing_active = true;
                update.trailing_activated = Some(profit);
            }
        }

        if pos.trailing_active {
            let candidate =
                pos.highest_price_since_entry * (1.0 - params.trailing_gap_pct / 100.0);
            // Ratchet: the stop only ever moves up.
            pos.trailing_stop = Some(match pos.trailing_stop {
                Some(current) => current.max(candidate),
                None => candidate,
            });
        }

        let (stop, reason) = pos.effective_stop();
        if bar.low <= stop {
            // A gap-down open below the stop fills at the worse price.
            let exit_price = bar.open.min(stop);
            let pnl_pct = if pos.entry_price == 0.0 {
                0.0
            } else {
                (exit_price - pos.entry_price) / pos.entry_price * 100.0
            };
            update.exit = Some(ExitFill {
                position: *pos,
                price: exit_price,
                reason,
                pnl_pct,
            });
            self.open = None;
        }

        update
    }
}
