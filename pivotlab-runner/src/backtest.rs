//! Backtest driver — the same session processor over a pre-fetched slice.

use serde::{Deserialize, Serialize};

use pivotlab_core::domain::{Bar, TradeRecord};
use pivotlab_core::engine::Session;
use pivotlab_core::events::EventSink;

use crate::config::{RunConfig, RunConfigError, RunId};
use crate::summary::TradeSummary;

/// Result of a complete run (backtest or finished live session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub run_id: RunId,
    pub bars_processed: usize,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub equity_curve: Vec<f64>,
    pub trades: Vec<TradeRecord>,
    pub summary: TradeSummary,
}

/// Run the strategy over `bars`, emitting every state change to `sink`.
///
/// The bars may arrive unsorted or with duplicates — the session's window
/// deduplicates by timestamp before processing, so a backtest over a raw
/// CSV export behaves exactly like the live driver fed the same data.
pub fn run_backtest(
    config: &RunConfig,
    bars: &[Bar],
    sink: &mut dyn EventSink,
) -> Result<BacktestReport, RunConfigError> {
    config.validate()?;
    let mut session = Session::new(config.strategy.clone(), config.account.clone())?;
    let bars_processed = session.ingest(bars, sink);
    Ok(report_for(config, &session, bars_processed))
}

pub(crate) fn report_for(
    config: &RunConfig,
    session: &Session,
    bars_processed: usize,
) -> BacktestReport {
    let summary = TradeSummary::compute(
        session.equity_curve(),
        session.trades(),
        config.account.initial_capital,
    );
    BacktestReport {
        run_id: config.run_id(),
        bars_processed,
        initial_capital: config.account.initial_capital,
        final_equity: session.current_equity(),
        equity_curve: session.equity_curve().to_vec(),
        trades: session.trades().to_vec(),
        summary,
    }
}
