//! Live polling driver.
//!
//! Replays an initial history fetch through the session, then polls the bar
//! source on a fixed interval, merging each small tail fetch into the
//! session window. The engine semantics are identical to the backtest
//! driver — only the feeding schedule differs. A stop flag is honored
//! between polls and between bars, never mid-bar.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use pivotlab_core::config::ConfigError;
use pivotlab_core::data::{BarSource, DataError};
use pivotlab_core::engine::Session;
use pivotlab_core::events::EventSink;

use crate::backtest::{report_for, BacktestReport};
use crate::config::{RunConfig, RunConfigError};

/// Bars requested per poll. Large enough to bridge a few missed cycles;
/// the window's dedup drops the overlap.
const POLL_FETCH_LIMIT: usize = 5;

/// Granularity of stop-flag checks while waiting out the poll interval.
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Config(#[from] RunConfigError),

    #[error("initial history fetch failed: {0}")]
    InitialFetch(#[from] DataError),

    #[error("not enough initial history: got {got} bars, need {need} for the first pivot")]
    NotEnoughHistory { got: usize, need: usize },
}

impl From<ConfigError> for LiveError {
    fn from(e: ConfigError) -> Self {
        LiveError::Config(RunConfigError::Invalid(e))
    }
}

/// Polling loop around one [`Session`].
pub struct LiveRunner {
    config: RunConfig,
    source: Box<dyn BarSource>,
    stop: Arc<AtomicBool>,
    poll_override: Option<Duration>,
}

impl LiveRunner {
    pub fn new(config: RunConfig, source: Box<dyn BarSource>, stop: Arc<AtomicBool>) -> Self {
        Self {
            config,
            source,
            stop,
            poll_override: None,
        }
    }

    /// Override the configured poll interval. Sub-second polling is only
    /// useful against scripted sources (tests) — public APIs rate limit.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_override = Some(interval);
        self
    }

    /// Run until the stop flag is raised. Returns the same report shape as
    /// the backtest driver, covering everything processed this session.
    pub fn run(&self, sink: &mut dyn EventSink) -> Result<BacktestReport, LiveError> {
        self.config.validate()?;
        let mut session = match self.config.runtime.window_capacity {
            Some(capacity) => Session::with_window_capacity(
                self.config.strategy.clone(),
                self.config.account.clone(),
                capacity,
            )?,
            None => Session::new(self.config.strategy.clone(), self.config.account.clone())?,
        };

        // Initial history replay: builds up pivot and position state just
        // like a backtest over the same bars would.
        let query = self.config.market_query();
        let history = self.source.fetch(&query)?;
        let need = self.config.strategy.min_lookback();
        if history.len() < need {
            return Err(LiveError::NotEnoughHistory {
                got: history.len(),
                need,
            });
        }
        let replayed = session.ingest(&history, sink);
        info!(
            pair = %query.pair(),
            source = self.source.name(),
            bars = replayed,
            "history replayed, entering poll loop"
        );

        let tail_query = query.with_limit(POLL_FETCH_LIMIT);
        let poll_interval = self
            .poll_override
            .unwrap_or_else(|| Duration::from_secs(self.config.runtime.poll_interval_secs));
        let mut bars_processed = replayed;

        while !self.stopped() && !self.wait(poll_interval) {
            match self.source.fetch(&tail_query) {
                Ok(bars) if bars.is_empty() => {
                    // Valid "no new data" — wait for the next cycle.
                    debug!("poll returned no bars");
                }
                Ok(bars) => {
                    let processed = session.ingest(&bars, sink);
                    bars_processed += processed;
                    if processed > 0 {
                        debug!(
                            processed,
                            last = ?session.last_timestamp(),
                            equity = session.current_equity(),
                            "new bars processed"
                        );
                    }
                }
                Err(e) => {
                    // Fetch failures skip the cycle; session state is kept.
                    warn!(error = %e, "candle fetch failed, retrying next poll");
                }
            }
        }

        info!(bars = bars_processed, "live session stopped");
        Ok(report_for(&self.config, &session, bars_processed))
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Sleep out the poll interval in small slices; returns `true` when
    /// the stop flag was raised while waiting.
    fn wait(&self, interval: Duration) -> bool {
        let mut remaining = interval;
        while remaining > Duration::ZERO {
            if self.stopped() {
                return true;
            }
            let slice = remaining.min(STOP_CHECK_INTERVAL);
            std::thread::sleep(slice);
            remaining -= slice;
        }
        self.stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pivotlab_core::data::synthetic::random_walk;
    use pivotlab_core::data::{Granularity, MarketQuery};
    use pivotlab_core::domain::Bar;
    use pivotlab_core::events::NullSink;
    use std::sync::Mutex;

    /// Source that serves a fixed history, then nothing.
    struct FixedSource {
        bars: Vec<Bar>,
        calls: Mutex<usize>,
    }

    impl BarSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self, query: &MarketQuery) -> Result<Vec<Bar>, DataError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Ok(self.bars.clone())
            } else {
                let tail = self.bars.len().saturating_sub(query.limit);
                Ok(self.bars[tail..].to_vec())
            }
        }
    }

    fn small_config() -> RunConfig {
        let mut config = RunConfig::default();
        config.strategy.left_strength = 3;
        config.strategy.right_strength = 3;
        config.market.history_limit = 100;
        config.runtime.poll_interval_secs = 1;
        config
    }

    fn walk(n: usize) -> Vec<Bar> {
        random_walk(
            5,
            n,
            100.0,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            Granularity::Hour,
        )
    }

    #[test]
    fn stops_immediately_when_flag_preraised() {
        let stop = Arc::new(AtomicBool::new(true));
        let source = FixedSource {
            bars: walk(100),
            calls: Mutex::new(0),
        };
        let runner = LiveRunner::new(small_config(), Box::new(source), stop);
        let report = runner.run(&mut NullSink).unwrap();
        // History replay still happened; no poll cycles ran.
        assert_eq!(report.bars_processed, 100);
    }

    #[test]
    fn refuses_to_start_on_thin_history() {
        let stop = Arc::new(AtomicBool::new(true));
        let source = FixedSource {
            bars: walk(3),
            calls: Mutex::new(0),
        };
        let runner = LiveRunner::new(small_config(), Box::new(source), stop);
        assert!(matches!(
            runner.run(&mut NullSink),
            Err(LiveError::NotEnoughHistory { got: 3, need: 7 })
        ));
    }
}
