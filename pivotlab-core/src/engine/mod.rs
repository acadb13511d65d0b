//! Engine: position state machine, equity ledger, session processor.

pub mod ledger;
pub mod position;
pub mod processor;

pub use ledger::EquityLedger;
pub use position::{ExitFill, PositionBook, RiskUpdate};
pub use processor::Session;
