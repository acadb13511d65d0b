//! Typed strategy and account parameters with load-time validation.
//!
//! Invalid configuration is the only fatal error class in the engine: every
//! parameter is checked up front, before any bar is processed, and the
//! session refuses to start on the first violation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which price field of the confirming bar the level lateness guard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardPrice {
    Close,
    High,
}

/// Pivot, level, and stop parameters for one trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Bars to the left of a candidate extremum that must be strictly beaten.
    pub left_strength: usize,
    /// Bars to the right that confirm the pivot; confirmation is delayed by
    /// exactly this many bars.
    pub right_strength: usize,
    /// Favorable excursion (percent from entry) that arms the trailing stop.
    pub profit_activation_pct: f64,
    /// Gap between the high watermark and the trailing stop, in percent.
    pub trailing_gap_pct: f64,
    /// Distance of the fixed emergency stop below entry, in percent.
    pub emergency_sl_pct: f64,
    /// Discard a freshly computed reentry level when the confirming bar has
    /// already traded past it.
    pub secure_level_guard: bool,
    /// Price field consulted by the lateness guard.
    pub guard_price: GuardPrice,
    /// When set, a right-side tie invalidates a pivot candidate. The default
    /// keeps the tie-tolerant rule most source variants use.
    pub strict_right_ties: bool,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            left_strength: 50,
            right_strength: 150,
            profit_activation_pct: 5.0,
            trailing_gap_pct: 5.0,
            emergency_sl_pct: 10.0,
            secure_level_guard: true,
            guard_price: GuardPrice::Close,
            strict_right_ties: false,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.left_strength == 0 {
            return Err(ConfigError::ZeroStrength { field: "left_strength" });
        }
        if self.right_strength == 0 {
            return Err(ConfigError::ZeroStrength {
                field: "right_strength",
            });
        }
        for (field, value) in [
            ("profit_activation_pct", self.profit_activation_pct),
            ("trailing_gap_pct", self.trailing_gap_pct),
            ("emergency_sl_pct", self.emergency_sl_pct),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativePercent { field, value });
            }
        }
        Ok(())
    }

    /// Bars needed before the first pivot can possibly confirm.
    pub fn min_lookback(&self) -> usize {
        self.left_strength + self.right_strength + 1
    }
}

/// Capital simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountParams {
    pub initial_capital: f64,
    /// Fraction of equity (in percent) committed per entry.
    pub position_pct: f64,
    /// Commission charged on notional at entry and exit, in percent.
    pub commission_pct: f64,
}

impl Default for AccountParams {
    fn default() -> Self {
        Self {
            initial_capital: 1_000.0,
            position_pct: 100.0,
            commission_pct: 0.0,
        }
    }
}

impl AccountParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::InvalidCapital {
                value: self.initial_capital,
            });
        }
        if !self.position_pct.is_finite()
            || self.position_pct <= 0.0
            || self.position_pct > 100.0
        {
            return Err(ConfigError::InvalidPositionPct {
                value: self.position_pct,
            });
        }
        if !self.commission_pct.is_finite() || self.commission_pct < 0.0 {
            return Err(ConfigError::NegativePercent {
                field: "commission_pct",
                value: self.commission_pct,
            });
        }
        Ok(())
    }
}

/// Why a configuration was rejected at load time.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a positive integer")]
    ZeroStrength { field: &'static str },

    #[error("{field} must be non-negative, got {value}")]
    NegativePercent { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("initial_capital must be positive, got {value}")]
    InvalidCapital { value: f64 },

    #[error("position_pct must be in (0, 100], got {value}")]
    InvalidPositionPct { value: f64 },
}
