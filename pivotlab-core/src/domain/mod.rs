//! Domain types: bars, pivots, positions, trades.

pub mod bar;
pub mod pivot;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use pivot::{PivotEvent, PivotKind};
pub use position::OpenPosition;
pub use trade::{ExitReason, TradeRecord};
