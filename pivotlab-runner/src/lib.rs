//! PivotLab Runner — run configuration, backtest and live drivers,
//! performance summary, CSV bar import/export.

pub mod backtest;
pub mod config;
pub mod csv_bars;
pub mod live;
pub mod sink;
pub mod summary;

pub use backtest::{run_backtest, BacktestReport};
pub use config::{MarketConfig, RunConfig, RunConfigError, RunId, RuntimeConfig};
pub use csv_bars::{read_bars_csv, write_bars_csv, CsvBarError};
pub use live::{LiveError, LiveRunner};
pub use sink::TracingSink;
pub use summary::TradeSummary;
