//! Reentry level construction: pair a confirmed high with the next
//! confirmed low into a midpoint level, guarded against late publication.

use crate::config::{GuardPrice, StrategyParams};
use crate::domain::Bar;

/// A published, not-yet-consumed reentry level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReentryLevel {
    pub price: f64,
    /// Bar index of the low that completed the pair.
    pub anchored_at: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingHigh {
    price: f64,
    bar_index: usize,
}

/// What processing a confirmed low produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelOutcome {
    /// The midpoint level went live.
    Activated { price: f64 },
    /// The midpoint was computed but price had already traded past it.
    DiscardedLate { price: f64, guard_price: f64 },
    /// No pending high, or the low did not come after it.
    NoPairing,
}

/// Pairs confirmed highs with subsequent confirmed lows.
///
/// A pending high is consumed exactly once, by the first qualifying low —
/// whether the resulting level is published or discarded as late.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelBuilder {
    pending_high: Option<PendingHigh>,
    active: Option<ReentryLevel>,
}

impl LevelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new confirmed high becomes the pending pair candidate and retires
    /// any previously active level.
    pub fn on_confirmed_high(&mut self, price: f64, bar_index: usize) {
        self.pending_high = Some(PendingHigh { price, bar_index });
        self.active = None;
    }

    /// A new confirmed low tries to complete the pair. `confirming_bar` is
    /// the bar on which the low was confirmed (not the bar of the low
    /// itself); the lateness guard reads its configured price field.
    pub fn on_confirmed_low(
        &mut self,
        price: f64,
        bar_index: usize,
        confirming_bar: &Bar,
        params: &StrategyParams,
    ) -> LevelOutcome {
        let Some(high) = self.pending_high else {
            return LevelOutcome::NoPairing;
        };
        if bar_index <= high.bar_index {
            return LevelOutcome::NoPairing;
        }

        // The high is consumed by this pairing no matter the outcome.
        self.pending_high = None;
        let level = (high.price + price) / 2.0;

        if params.secure_level_guard {
            let guard_price = match params.guard_price {
                GuardPrice::Close => confirming_bar.close,
                GuardPrice::High => confirming_bar.high,
            };
            if guard_price > level {
                self.active = None;
                return LevelOutcome::DiscardedLate {
                    price: level,
                    guard_price,
                };
            }
        }

        self.active = Some(ReentryLevel {
            price: level,
            anchored_at: bar_index,
        });
        LevelOutcome::Activated { price: level }
    }

    pub fn active(&self) -> Option<ReentryLevel> {
        self.active
    }

    /// Consume the active level (entry cross fired — single use).
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    pub fn has_pending_high(&self) -> bool {
        self.pending_high.is_some()
    }
}
