//! Seeded random-walk OHLC generator for tests, benches, and offline runs.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::Granularity;
use crate::domain::Bar;

/// Generate `count` sane bars as a geometric random walk starting at
/// `start_price`. Deterministic for a given seed.
pub fn random_walk(
    seed: u64,
    count: usize,
    start_price: f64,
    start_time: DateTime<Utc>,
    granularity: Granularity,
) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(count);
    let mut open = start_price;

    for i in 0..count {
        // Per-bar drift in the ±2% range, with intrabar range on top.
        let drift: f64 = rng.gen_range(-0.02..0.02);
        let close = (open * (1.0 + drift)).max(0.01);
        let up_wick: f64 = rng.gen_range(0.0..0.01);
        let down_wick: f64 = rng.gen_range(0.0..0.01);
        let high = open.max(close) * (1.0 + up_wick);
        let low = (open.min(close) * (1.0 - down_wick)).max(0.005);

        bars.push(Bar {
            timestamp: start_time + Duration::seconds(granularity.seconds() * i as i64),
            open,
            high,
            low,
            close,
            volume: rng.gen_range(1.0..1_000.0),
        });
        open = close;
    }

    bars
}
