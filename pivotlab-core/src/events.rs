//! Structured strategy events and the sink boundary.
//!
//! The engine reports every state change through [`EventSink`] and has no
//! opinion on rendering — console, log lines, push notifications, or a test
//! recorder are all just sink implementations.

use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, PivotKind};

/// Everything the session reports to the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrategyEvent {
    /// A pivot passed the alternation gate.
    PivotConfirmed {
        kind: PivotKind,
        price: f64,
        /// Bar index where the extremum printed (not where it confirmed).
        bar_index: usize,
    },
    /// A high/low pair produced a live reentry level.
    LevelActivated { price: f64 },
    /// The pair's level was discarded because price had already run past it.
    LevelDiscardedLate { price: f64, guard_price: f64 },
    /// A long position was opened.
    PositionOpened {
        price: f64,
        quantity: f64,
        /// The emergency stop fixed at entry.
        stop: f64,
    },
    /// The trailing stop armed after the profit threshold was reached.
    TrailingActivated { profit_pct: f64 },
    /// The position was closed by one of the two stops.
    PositionClosed {
        price: f64,
        reason: ExitReason,
        pnl_pct: f64,
    },
}

/// Receiver for strategy events.
pub trait EventSink {
    fn emit(&mut self, event: &StrategyEvent);
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &StrategyEvent) {}
}

/// Sink that records every event in order. Used by tests, in particular the
/// backtest/live equivalence check.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<StrategyEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &StrategyEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_preserves_order() {
        let mut sink = RecordingSink::new();
        sink.emit(&StrategyEvent::LevelActivated { price: 100.0 });
        sink.emit(&StrategyEvent::PositionOpened {
            price: 101.0,
            quantity: 1.0,
            stop: 90.9,
        });
        assert_eq!(sink.events.len(), 2);
        assert_eq!(
            sink.events[0],
            StrategyEvent::LevelActivated { price: 100.0 }
        );
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = StrategyEvent::PositionClosed {
            price: 104.5,
            reason: ExitReason::TrailingStop,
            pnl_pct: 0.48,
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: StrategyEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }
}
