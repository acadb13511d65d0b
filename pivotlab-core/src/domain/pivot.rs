//! Swing pivot kinds and confirmed pivot events.

use serde::{Deserialize, Serialize};

/// Which side of a swing a pivot marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotKind {
    High,
    Low,
}

impl PivotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PivotKind::High => "high",
            PivotKind::Low => "low",
        }
    }
}

/// A confirmed swing pivot.
///
/// `occurred_at` is the bar index where the extremum printed, which is always
/// `right_strength` bars before the bar that confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotEvent {
    pub kind: PivotKind,
    pub price: f64,
    pub occurred_at: usize,
}
