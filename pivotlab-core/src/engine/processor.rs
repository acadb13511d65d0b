//! Session — the per-bar pipeline that ties the scan, the gate, the level
//! builder, and the position book together.
//!
//! One `Session` owns all mutable state for one instrument and lifetime.
//! Each newly closed bar runs the same fixed sequence: pivot scan at the
//! confirmation-delayed index, alternation gate, level pairing, entry
//! trigger, risk update, equity mark. Later steps depend on the state the
//! earlier steps mutated within the same bar, so the order never varies.

use crate::config::{AccountParams, ConfigError, StrategyParams};
use crate::data::window::{BarWindow, MergeOutcome};
use crate::domain::{Bar, PivotKind, TradeRecord};
use crate::engine::ledger::EquityLedger;
use crate::engine::position::PositionBook;
use crate::events::{EventSink, StrategyEvent};
use crate::signals::{AlternationGate, LevelBuilder, LevelOutcome, PivotScan};

/// Single-instrument trading session: bar window, signal state, position
/// book, equity ledger, and the trade log.
#[derive(Debug)]
pub struct Session {
    params: StrategyParams,
    account: AccountParams,
    scan: PivotScan,
    gate: AlternationGate,
    levels: LevelBuilder,
    book: PositionBook,
    ledger: EquityLedger,
    window: BarWindow,
    trades: Vec<TradeRecord>,
    bars_processed: usize,
}

impl Session {
    /// Validates the configuration before any bar is processed; an invalid
    /// parameter set is the only fatal error in the engine.
    pub fn new(params: StrategyParams, account: AccountParams) -> Result<Self, ConfigError> {
        let window = BarWindow::unbounded(params.min_lookback());
        Self::with_window(params, account, window)
    }

    /// Live sessions bound the window; `capacity` is clamped so trimming
    /// never starves the pivot lookback.
    pub fn with_window_capacity(
        params: StrategyParams,
        account: AccountParams,
        capacity: usize,
    ) -> Result<Self, ConfigError> {
        let min_retain = params.min_lookback();
        let window = BarWindow::with_capacity(capacity, min_retain);
        Self::with_window(params, account, window)
    }

    fn with_window(
        params: StrategyParams,
        account: AccountParams,
        window: BarWindow,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        account.validate()?;
        Ok(Self {
            scan: PivotScan::from_params(&params),
            gate: AlternationGate::new(),
            levels: LevelBuilder::new(),
            book: PositionBook::new(),
            ledger: EquityLedger::new(account.initial_capital),
            window,
            trades: Vec::new(),
            bars_processed: 0,
            params,
            account,
        })
    }

    /// Merge a batch of fetched bars and process every newly appended
    /// closed bar, in order. Duplicates are deduplicated (last write wins)
    /// and out-of-order bars skipped before the engine sees anything.
    /// Returns the number of bars processed.
    pub fn ingest(&mut self, bars: &[Bar], sink: &mut dyn EventSink) -> usize {
        let mut processed = 0;
        for &bar in bars {
            match self.window.merge(bar) {
                MergeOutcome::Appended(index) => {
                    self.process_bar(index, sink);
                    processed += 1;
                }
                MergeOutcome::Replaced(_) | MergeOutcome::Stale => {}
            }
        }
        processed
    }

    /// One full pipeline pass over the bar at `index` (absolute).
    fn process_bar(&mut self, index: usize, sink: &mut dyn EventSink) {
        let bar = *self
            .window
            .get(index)
            .expect("process_bar called for a bar outside the window");
        let offset = index - self.window.first_index();
        let base = self.window.first_index();

        // (a) Pivot scan, confirmation-delayed: evaluate the bar that
        // printed `right_strength` bars ago, never the current one.
        let raw_high = self
            .scan
            .confirmable(self.window.high_series(), offset, PivotKind::High);
        let raw_low = self
            .scan
            .confirmable(self.window.low_series(), offset, PivotKind::Low);

        // (b) + (c) Alternation gate, then level pairing. The high is
        // handled first so a range top and bottom confirming together
        // pair up within this very bar.
        if let Some(pivot) = raw_high {
            if self.gate.admit(PivotKind::High) {
                let occurred_at = base + pivot.occurred_at;
                sink.emit(&StrategyEvent::PivotConfirmed {
                    kind: PivotKind::High,
                    price: pivot.price,
                    bar_index: occurred_at,
                });
                self.levels.on_confirmed_high(pivot.price, occurred_at);
            }
        }
        if let Some(pivot) = raw_low {
            if self.gate.admit(PivotKind::Low) {
                let occurred_at = base + pivot.occurred_at;
                sink.emit(&StrategyEvent::PivotConfirmed {
                    kind: PivotKind::Low,
                    price: pivot.price,
                    bar_index: occurred_at,
                });
                match self
                    .levels
                    .on_confirmed_low(pivot.price, occurred_at, &bar, &self.params)
                {
                    LevelOutcome::Activated { price } => {
                        sink.emit(&StrategyEvent::LevelActivated { price });
                    }
                    LevelOutcome::DiscardedLate { price, guard_price } => {
                        sink.emit(&StrategyEvent::LevelDiscardedLate { price, guard_price });
                    }
                    LevelOutcome::NoPairing => {}
                }
            }
        }

        // (d) Entry trigger: bullish close above the live level. The level
        // is consumed the moment the cross fires, whether or not an entry
        // was possible — single use.
        if let Some(level) = self.levels.active() {
            if bar.is_bullish() && bar.close > level.price {
                if !self.book.is_open() {
                    self.open_position(&bar, index, sink);
                }
                self.levels.clear_active();
            }
        }

        // (e) Risk update on the same bar, entry bars included.
        let update = self.book.update(&bar, &self.params);
        if let Some(profit_pct) = update.trailing_activated {
            sink.emit(&StrategyEvent::TrailingActivated { profit_pct });
        }
        if let Some(exit) = update.exit {
            let pos = exit.position;
            let proceeds = exit.price * pos.quantity;
            let exit_commission = proceeds * self.account.commission_pct / 100.0;
            self.ledger
                .apply_exit(pos.entry_price, exit.price, pos.quantity, exit_commission);

            let gross_pnl = (exit.price - pos.entry_price) * pos.quantity;
            let commission = pos.entry_commission + exit_commission;
            self.trades.push(TradeRecord {
                entry_bar: pos.entry_bar,
                entry_time: pos.entry_time,
                entry_price: pos.entry_price,
                exit_bar: index,
                exit_time: bar.timestamp,
                exit_price: exit.price,
                quantity: pos.quantity,
                gross_pnl,
                commission,
                net_pnl: gross_pnl - commission,
                pnl_pct: exit.pnl_pct,
                exit_reason: exit.reason,
            });
            sink.emit(&StrategyEvent::PositionClosed {
                price: exit.price,
                reason: exit.reason,
                pnl_pct: exit.pnl_pct,
            });
        }

        // (f) Mark equity at the bar close.
        let open_value = self
            .book
            .position()
            .map(|p| p.quantity * bar.close)
            .unwrap_or(0.0);
        self.ledger.mark(open_value);
        self.bars_processed += 1;
    }

    fn open_position(&mut self, bar: &Bar, index: usize, sink: &mut dyn EventSink) {
        let investment = self.ledger.allocation(self.account.position_pct);
        if bar.close <= 0.0 || investment <= 0.0 {
            // Degenerate entry price or an exhausted account: the cross
            // still consumes the level, but no position can open.
            return;
        }
        let quantity = investment / bar.close;
        let commission = investment * self.account.commission_pct / 100.0;
        self.ledger.apply_entry(bar.close, quantity, commission);
        let position = self
            .book
            .open_long(bar.close, quantity, index, bar.timestamp, commission, &self.params);
        sink.emit(&StrategyEvent::PositionOpened {
            price: position.entry_price,
            quantity,
            stop: position.emergency_stop,
        });
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn account(&self) -> &AccountParams {
        &self.account
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[f64] {
        self.ledger.history()
    }

    /// Current equity, marking any open position at the latest close.
    pub fn current_equity(&self) -> f64 {
        let open_value = match (self.book.position(), self.window.bars().last()) {
            (Some(pos), Some(bar)) => pos.quantity * bar.close,
            _ => 0.0,
        };
        self.ledger.equity(open_value)
    }

    pub fn commission_paid(&self) -> f64 {
        self.ledger.commission_paid()
    }

    pub fn position(&self) -> Option<&crate::domain::OpenPosition> {
        self.book.position()
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    pub fn last_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.window.last_timestamp()
    }
}
