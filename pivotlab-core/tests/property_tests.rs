//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Pivot symmetry — a high on a series is a low on its negation
//! 2. Alternation — confirmed pivot kinds never repeat back-to-back
//! 3. Ratchet monotonicity — the trailing stop never moves down
//! 4. Single position — opens and closes strictly alternate
//! 5. Level single-use — entries never outnumber activated levels
//! 6. Ingest equivalence — one batch vs. overlapping incremental batches

use chrono::DateTime;
use proptest::prelude::*;

use pivotlab_core::config::{AccountParams, StrategyParams};
use pivotlab_core::data::synthetic::random_walk;
use pivotlab_core::data::Granularity;
use pivotlab_core::domain::PivotKind;
use pivotlab_core::engine::{PositionBook, Session};
use pivotlab_core::events::{RecordingSink, StrategyEvent};
use pivotlab_core::signals::PivotScan;

fn small_params() -> StrategyParams {
    StrategyParams {
        left_strength: 3,
        right_strength: 3,
        profit_activation_pct: 2.0,
        trailing_gap_pct: 2.0,
        emergency_sl_pct: 5.0,
        ..Default::default()
    }
}

fn start_time() -> chrono::DateTime<chrono::Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

// ── 1. Pivot symmetry ────────────────────────────────────────────────

proptest! {
    /// find_pivot(S, i, L, R, High) == find_pivot(-S, i, L, R, Low).
    #[test]
    fn pivot_high_on_series_is_low_on_negation(
        prices in prop::collection::vec(1.0..1_000.0_f64, 5..50),
        at in 0usize..50,
        left in 1usize..4,
        right in 1usize..4,
        strict in prop::bool::ANY,
    ) {
        let scan = PivotScan { left, right, strict_right_ties: strict };
        let negated: Vec<f64> = prices.iter().map(|p| -p).collect();

        let high = scan.find(&prices, at, PivotKind::High);
        let low_on_negated = scan.find(&negated, at, PivotKind::Low);

        prop_assert_eq!(high.map(|p| -p), low_on_negated);
    }

    /// The scan never reports a pivot whose window does not fit.
    #[test]
    fn pivot_window_bounds_respected(
        prices in prop::collection::vec(1.0..1_000.0_f64, 5..50),
        left in 1usize..5,
        right in 1usize..5,
    ) {
        let scan = PivotScan { left, right, strict_right_ties: false };
        for at in 0..prices.len() {
            let fits = at >= left && at + right < prices.len();
            if !fits {
                prop_assert_eq!(scan.find(&prices, at, PivotKind::High), None);
                prop_assert_eq!(scan.find(&prices, at, PivotKind::Low), None);
            }
        }
    }
}

// ── 2./4./5. Session invariants over random walks ────────────────────

fn session_events(seed: u64, count: usize) -> Vec<StrategyEvent> {
    let bars = random_walk(seed, count, 100.0, start_time(), Granularity::Hour);
    let mut session = Session::new(small_params(), AccountParams::default()).unwrap();
    let mut sink = RecordingSink::new();
    session.ingest(&bars, &mut sink);
    sink.events
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Confirmed pivot kinds strictly alternate.
    #[test]
    fn confirmed_pivots_alternate(seed in any::<u64>()) {
        let events = session_events(seed, 400);
        let kinds: Vec<PivotKind> = events
            .iter()
            .filter_map(|e| match e {
                StrategyEvent::PivotConfirmed { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        for pair in kinds.windows(2) {
            prop_assert_ne!(pair[0], pair[1], "two consecutive {:?} pivots", pair[0]);
        }
    }

    /// Position lifecycle is Flat→Open→Flat→…: opens and closes alternate,
    /// starting with an open.
    #[test]
    fn position_opens_and_closes_alternate(seed in any::<u64>()) {
        let events = session_events(seed, 400);
        let mut open = false;
        for event in &events {
            match event {
                StrategyEvent::PositionOpened { .. } => {
                    prop_assert!(!open, "entry while a position is already open");
                    open = true;
                }
                StrategyEvent::PositionClosed { .. } => {
                    prop_assert!(open, "exit without an open position");
                    open = false;
                }
                _ => {}
            }
        }
    }

    /// Every entry consumes an activated level: entries never outnumber
    /// activations.
    #[test]
    fn entries_never_outnumber_activated_levels(seed in any::<u64>()) {
        let events = session_events(seed, 400);
        let mut activated = 0usize;
        let mut opened = 0usize;
        for event in &events {
            match event {
                StrategyEvent::LevelActivated { .. } => activated += 1,
                StrategyEvent::PositionOpened { .. } => {
                    opened += 1;
                    prop_assert!(opened <= activated, "entry without a fresh level");
                }
                _ => {}
            }
        }
    }

    /// Trailing activation happens at most once per position.
    #[test]
    fn trailing_arms_at_most_once_per_position(seed in any::<u64>()) {
        let events = session_events(seed, 400);
        let mut armed_this_position = false;
        for event in &events {
            match event {
                StrategyEvent::PositionOpened { .. } => armed_this_position = false,
                StrategyEvent::TrailingActivated { .. } => {
                    prop_assert!(!armed_this_position, "trailing armed twice");
                    armed_this_position = true;
                }
                _ => {}
            }
        }
    }
}

// ── 3. Ratchet monotonicity ──────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Once trailing is active, the stop never decreases for the rest of
    /// the position's life.
    #[test]
    fn trailing_stop_is_monotone(seed in any::<u64>()) {
        let params = small_params();
        let bars = random_walk(seed, 200, 100.0, start_time(), Granularity::Hour);
        let mut book = PositionBook::new();
        book.open_long(100.0, 1.0, 0, start_time(), 0.0, &params);

        let mut last_stop = f64::NEG_INFINITY;
        for bar in &bars {
            let update = book.update(bar, &params);
            if let Some(pos) = book.position() {
                if let Some(stop) = pos.trailing_stop {
                    prop_assert!(
                        stop >= last_stop - 1e-12,
                        "trailing stop moved down: {last_stop} -> {stop}"
                    );
                    last_stop = stop;
                }
            }
            if update.exit.is_some() {
                break;
            }
        }
    }
}

// ── 6. Ingest equivalence ────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Feeding the whole history at once, one bar at a time, or in
    /// overlapping re-fetched chunks produces the identical event stream.
    #[test]
    fn ingest_is_batch_invariant(seed in any::<u64>(), chunk in 1usize..7) {
        let bars = random_walk(seed, 300, 100.0, start_time(), Granularity::Hour);
        let account = AccountParams::default();

        let mut all_at_once = Session::new(small_params(), account.clone()).unwrap();
        let mut batch_sink = RecordingSink::new();
        all_at_once.ingest(&bars, &mut batch_sink);

        let mut incremental = Session::new(small_params(), account).unwrap();
        let mut inc_sink = RecordingSink::new();
        let mut i = 0;
        while i < bars.len() {
            let end = (i + chunk).min(bars.len());
            // Overlap the previous few bars to mimic live re-fetches.
            let from = i.saturating_sub(3);
            incremental.ingest(&bars[from..end], &mut inc_sink);
            i = end;
        }

        prop_assert_eq!(batch_sink.events, inc_sink.events);
        prop_assert_eq!(all_at_once.trades().len(), incremental.trades().len());
    }
}
