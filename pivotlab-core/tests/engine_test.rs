//! End-to-end session scenarios: pivot confirmation → alternation → level
//! → entry → trailing → exit, with the exact event sequence asserted.

use chrono::DateTime;
use pivotlab_core::config::{AccountParams, StrategyParams};
use pivotlab_core::domain::{Bar, ExitReason, PivotKind};
use pivotlab_core::engine::Session;
use pivotlab_core::events::{RecordingSink, StrategyEvent};

fn params() -> StrategyParams {
    StrategyParams {
        left_strength: 2,
        right_strength: 2,
        profit_activation_pct: 5.0,
        trailing_gap_pct: 5.0,
        emergency_sl_pct: 10.0,
        ..Default::default()
    }
}

fn account() -> AccountParams {
    AccountParams {
        initial_capital: 1_000.0,
        position_pct: 100.0,
        commission_pct: 0.0,
    }
}

fn bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: DateTime::from_timestamp(1_700_000_000 + i * 3_600, 0).unwrap(),
        open,
        high,
        low,
        close,
        volume: 1.0,
    }
}

/// Rally to a swing high at bar 4, selloff into a swing low at bar 8,
/// reentry breakout at bar 11, trailing exit at bar 13.
fn breakout_series() -> Vec<Bar> {
    vec![
        bar(0, 99.0, 100.0, 98.0, 99.5),
        bar(1, 100.5, 102.0, 100.0, 101.5),
        bar(2, 102.5, 104.0, 102.0, 103.5),
        bar(3, 104.5, 106.0, 104.0, 105.5),
        bar(4, 108.0, 110.0, 107.0, 109.0), // swing high prints here
        bar(5, 106.0, 107.0, 104.0, 105.0),
        bar(6, 104.0, 105.0, 100.0, 101.0), // high confirms here
        bar(7, 99.0, 100.0, 96.0, 97.0),
        bar(8, 94.0, 95.0, 90.0, 91.0), // swing low prints here
        bar(9, 95.0, 97.0, 94.0, 96.0),
        bar(10, 97.0, 99.0, 96.0, 99.0), // low confirms; level (110+90)/2 = 100
        bar(11, 99.0, 104.5, 98.5, 104.0), // bullish close above 100: entry
        bar(12, 105.5, 110.0, 105.0, 109.0), // watermark 110: trailing arms at 104.5
        bar(13, 108.0, 108.5, 103.0, 103.5), // low breaches 104.5: trailing exit
    ]
}

#[test]
fn full_breakout_round_trip() {
    let mut session = Session::new(params(), account()).unwrap();
    let mut sink = RecordingSink::new();
    let processed = session.ingest(&breakout_series(), &mut sink);
    assert_eq!(processed, 14);

    let quantity = 1_000.0 / 104.0;
    assert_eq!(sink.events.len(), 6);

    assert_eq!(
        sink.events[0],
        StrategyEvent::PivotConfirmed {
            kind: PivotKind::High,
            price: 110.0,
            bar_index: 4
        }
    );
    assert_eq!(
        sink.events[1],
        StrategyEvent::PivotConfirmed {
            kind: PivotKind::Low,
            price: 90.0,
            bar_index: 8
        }
    );
    assert_eq!(sink.events[2], StrategyEvent::LevelActivated { price: 100.0 });

    match &sink.events[3] {
        StrategyEvent::PositionOpened { price, quantity: q, stop } => {
            assert_eq!(*price, 104.0);
            assert!((q - quantity).abs() < 1e-9);
            assert!((stop - 104.0 * 0.9).abs() < 1e-9);
        }
        other => panic!("expected PositionOpened, got {other:?}"),
    }

    match &sink.events[4] {
        StrategyEvent::TrailingActivated { profit_pct } => {
            assert!((profit_pct - (110.0 - 104.0) / 104.0 * 100.0).abs() < 1e-9);
        }
        other => panic!("expected TrailingActivated, got {other:?}"),
    }

    match &sink.events[5] {
        StrategyEvent::PositionClosed { price, reason, pnl_pct } => {
            assert!((price - 104.5).abs() < 1e-9); // 110 * 0.95
            assert_eq!(*reason, ExitReason::TrailingStop);
            assert!((pnl_pct - 0.5 / 104.0 * 100.0).abs() < 1e-9);
        }
        other => panic!("expected PositionClosed, got {other:?}"),
    }

    assert_eq!(session.trades().len(), 1);
    let trade = &session.trades()[0];
    assert_eq!(trade.entry_bar, 11);
    assert_eq!(trade.exit_bar, 13);
    assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
    assert!((trade.net_pnl - quantity * 0.5).abs() < 1e-9);

    assert!(session.position().is_none());
    assert!((session.current_equity() - (1_000.0 + quantity * 0.5)).abs() < 1e-9);
}

#[test]
fn late_level_is_discarded_and_never_trades() {
    let mut bars = breakout_series();
    // The confirming bar closes above the would-be level of 100.
    bars[10] = bar(10, 97.0, 101.5, 96.0, 101.0);
    bars.truncate(12);

    let mut session = Session::new(params(), account()).unwrap();
    let mut sink = RecordingSink::new();
    session.ingest(&bars, &mut sink);

    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, StrategyEvent::LevelDiscardedLate { price, guard_price }
            if *price == 100.0 && *guard_price == 101.0)));
    assert!(!sink
        .events
        .iter()
        .any(|e| matches!(e, StrategyEvent::PositionOpened { .. })));
    assert!(session.trades().is_empty());
}

#[test]
fn emergency_stop_fires_on_gap_down() {
    let mut bars = breakout_series();
    // Replace the rally after entry with a crash that gaps below the
    // emergency stop (104 * 0.9 = 93.6).
    bars[12] = bar(12, 92.0, 93.0, 88.0, 89.0);
    bars.truncate(13);

    let mut session = Session::new(params(), account()).unwrap();
    let mut sink = RecordingSink::new();
    session.ingest(&bars, &mut sink);

    let closed = sink
        .events
        .iter()
        .find_map(|e| match e {
            StrategyEvent::PositionClosed { price, reason, pnl_pct } => {
                Some((*price, *reason, *pnl_pct))
            }
            _ => None,
        })
        .expect("position must close");

    // Gap-down open below the stop fills at the open, not the stop.
    assert_eq!(closed.0, 92.0);
    assert_eq!(closed.1, ExitReason::EmergencyStop);
    assert!((closed.2 - (92.0 - 104.0) / 104.0 * 100.0).abs() < 1e-9);

    let trade = &session.trades()[0];
    assert!(trade.net_pnl < 0.0);
    assert_eq!(trade.exit_reason, ExitReason::EmergencyStop);
}

#[test]
fn no_entry_without_bullish_cross() {
    let mut bars = breakout_series();
    // Bar 11 closes above the level but bearish (close < open).
    bars[11] = bar(11, 105.0, 105.5, 98.5, 104.0);
    bars.truncate(12);

    let mut session = Session::new(params(), account()).unwrap();
    let mut sink = RecordingSink::new();
    session.ingest(&bars, &mut sink);

    assert!(!sink
        .events
        .iter()
        .any(|e| matches!(e, StrategyEvent::PositionOpened { .. })));
    // The level survives an unqualified cross: only a bullish close
    // consumes it.
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, StrategyEvent::LevelActivated { .. })));
}

#[test]
fn insufficient_history_emits_nothing() {
    let mut session = Session::new(params(), account()).unwrap();
    let mut sink = RecordingSink::new();
    // Fewer bars than left + right + 1: no pivot can confirm.
    session.ingest(&breakout_series()[..4], &mut sink);
    assert!(sink.events.is_empty());
}
