//! Windowed swing-pivot scan with delayed confirmation.
//!
//! A candidate extremum at index `i` must strictly beat every price in the
//! `left` bars before it. On the right, only a strictly *better* later price
//! invalidates it — a tie does not — so confirmation is decided exactly
//! `right` bars after the extremum printed. `strict_right_ties` flips the
//! right-side rule to `>=`/`<=` for parity with the stricter variants.

use serde::{Deserialize, Serialize};

use crate::config::StrategyParams;
use crate::domain::{PivotEvent, PivotKind};

/// Pivot scan window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotScan {
    pub left: usize,
    pub right: usize,
    pub strict_right_ties: bool,
}

impl PivotScan {
    pub fn new(left: usize, right: usize) -> Self {
        Self {
            left,
            right,
            strict_right_ties: false,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self {
            left: params.left_strength,
            right: params.right_strength,
            strict_right_ties: params.strict_right_ties,
        }
    }

    /// Test whether `prices[at]` is a pivot of the given kind.
    ///
    /// Returns `None` — not an error — when the window does not fit: fewer
    /// than `left` bars before `at` or fewer than `right` bars after it.
    pub fn find(&self, prices: &[f64], at: usize, kind: PivotKind) -> Option<f64> {
        if at < self.left || at + self.right >= prices.len() {
            return None;
        }
        let candidate = prices[at];
        if !candidate.is_finite() {
            return None;
        }

        for &p in &prices[at - self.left..at] {
            let beaten = match kind {
                PivotKind::High => p >= candidate,
                PivotKind::Low => p <= candidate,
            };
            if beaten {
                return None;
            }
        }

        for &p in &prices[at + 1..=at + self.right] {
            let beaten = match kind {
                PivotKind::High if self.strict_right_ties => p >= candidate,
                PivotKind::High => p > candidate,
                PivotKind::Low if self.strict_right_ties => p <= candidate,
                PivotKind::Low => p < candidate,
            };
            if beaten {
                return None;
            }
        }

        Some(candidate)
    }

    /// The pivot that becomes knowable once `current` is the latest bar:
    /// the one that printed `right` bars earlier. Never evaluates the
    /// current bar itself.
    pub fn confirmable(&self, prices: &[f64], current: usize, kind: PivotKind) -> Option<PivotEvent> {
        if current >= prices.len() {
            return None;
        }
        let occurred_at = current.checked_sub(self.right)?;
        self.find(&prices[..=current], occurred_at, kind)
            .map(|price| PivotEvent {
                kind,
                price,
                occurred_at,
            })
    }
}
