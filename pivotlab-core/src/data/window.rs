//! Rolling in-memory bar window with timestamp-keyed deduplication.
//!
//! The window is the session's only bar store. Merging is keyed by
//! timestamp: strictly newer bars append, a re-fetch of an already stored
//! timestamp overwrites that bar (last write wins), and anything older than
//! the window's tail with no matching timestamp is ignored. Bar indices are
//! absolute across the session — trimming the front advances `first_index`
//! instead of renumbering.

use chrono::{DateTime, Utc};

use crate::domain::Bar;

/// What [`BarWindow::merge`] did with one incoming bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new closed bar; the payload is its absolute index. Only this
    /// outcome hands the bar to the engine.
    Appended(usize),
    /// Same timestamp as a stored bar: the stored copy was overwritten.
    Replaced(usize),
    /// Older than anything retained and not a timestamp match — dropped.
    Stale,
}

/// Rolling window over the bar history of one session.
#[derive(Debug, Clone)]
pub struct BarWindow {
    bars: Vec<Bar>,
    // Parallel price series kept in sync with `bars` so the pivot scan
    // borrows a slice instead of re-collecting every bar.
    highs: Vec<f64>,
    lows: Vec<f64>,
    first_index: usize,
    capacity: Option<usize>,
    /// Trimming never drops below this many bars (the scanner's lookback).
    min_retain: usize,
}

impl BarWindow {
    /// Unbounded window (backtests).
    pub fn unbounded(min_retain: usize) -> Self {
        Self {
            bars: Vec::new(),
            highs: Vec::new(),
            lows: Vec::new(),
            first_index: 0,
            capacity: None,
            min_retain,
        }
    }

    /// Bounded window (live sessions); `capacity` is clamped up to
    /// `min_retain` so trimming cannot starve the pivot scan.
    pub fn with_capacity(capacity: usize, min_retain: usize) -> Self {
        Self {
            capacity: Some(capacity.max(min_retain)),
            ..Self::unbounded(min_retain)
        }
    }

    pub fn merge(&mut self, bar: Bar) -> MergeOutcome {
        match self.bars.last() {
            None => self.append(bar),
            Some(last) if bar.timestamp > last.timestamp => self.append(bar),
            _ => self.overwrite_or_drop(bar),
        }
    }

    fn append(&mut self, bar: Bar) -> MergeOutcome {
        self.bars.push(bar);
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        let index = self.first_index + self.bars.len() - 1;
        self.trim();
        MergeOutcome::Appended(index)
    }

    fn overwrite_or_drop(&mut self, bar: Bar) -> MergeOutcome {
        // Re-fetches land near the tail, so scan from the back.
        for (offset, stored) in self.bars.iter_mut().enumerate().rev() {
            if stored.timestamp == bar.timestamp {
                *stored = bar;
                self.highs[offset] = bar.high;
                self.lows[offset] = bar.low;
                return MergeOutcome::Replaced(self.first_index + offset);
            }
            if stored.timestamp < bar.timestamp {
                break;
            }
        }
        MergeOutcome::Stale
    }

    fn trim(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let keep = capacity.max(self.min_retain);
        if self.bars.len() > keep {
            let drop = self.bars.len() - keep;
            self.bars.drain(..drop);
            self.highs.drain(..drop);
            self.lows.drain(..drop);
            self.first_index += drop;
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Absolute index of the oldest retained bar.
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    /// Absolute index the next appended bar will get.
    pub fn next_index(&self) -> usize {
        self.first_index + self.bars.len()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index.checked_sub(self.first_index)?)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn high_series(&self) -> &[f64] {
        &self.highs
    }

    pub fn low_series(&self) -> &[f64] {
        &self.lows
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }
}
