//! Performance summary — pure functions over the equity curve and trade log.

use serde::{Deserialize, Serialize};

use pivotlab_core::domain::TradeRecord;

/// Aggregate statistics for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSummary {
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction of winners, 0.0 when no trades closed.
    pub win_rate: f64,
    pub total_net_pnl: f64,
    /// Total return as a fraction of initial capital.
    pub total_return: f64,
    pub avg_net_pnl: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub commission_paid: f64,
}

impl TradeSummary {
    pub fn compute(equity_curve: &[f64], trades: &[TradeRecord], initial_capital: f64) -> Self {
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let total_net_pnl: f64 = trades.iter().map(|t| t.net_pnl).sum();
        let commission_paid: f64 = trades.iter().map(|t| t.commission).sum();
        Self {
            trade_count: trades.len(),
            winning_trades,
            losing_trades: trades.len() - winning_trades,
            win_rate: win_rate(trades),
            total_net_pnl,
            total_return: if initial_capital > 0.0 {
                total_net_pnl / initial_capital
            } else {
                0.0
            },
            avg_net_pnl: if trades.is_empty() {
                0.0
            } else {
                total_net_pnl / trades.len() as f64
            },
            profit_factor: profit_factor(trades),
            max_drawdown: max_drawdown(equity_curve),
            commission_paid,
        }
    }
}

/// Fraction of closed trades with positive net PnL.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross wins over gross losses. Infinite when there are wins but no
/// losses; zero when there are no wins.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let wins: f64 = trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl).sum();
    let losses: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| -t.net_pnl)
        .sum();
    if losses == 0.0 {
        if wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        wins / losses
    }
}

/// Deepest peak-to-trough decline of the equity curve, as a fraction.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &equity in equity_curve {
        peak = peak.max(equity);
        if peak > 0.0 {
            worst = worst.max((peak - equity) / peak);
        }
    }
    worst
}
