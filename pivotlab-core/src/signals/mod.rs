//! Signal logic: pivot scan, alternation gate, reentry level builder.

pub mod alternation;
pub mod level;
pub mod pivot;

pub use alternation::AlternationGate;
pub use level::{LevelBuilder, LevelOutcome, ReentryLevel};
pub use pivot::PivotScan;
