//! CSV import/export of bars for offline backtests.
//!
//! Columns: `timestamp,open,high,low,close,volume` with RFC 3339
//! timestamps. Ordering and duplicates are not enforced here — the
//! session's window deduplicates on ingest.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pivotlab_core::domain::Bar;

#[derive(Debug, Error)]
pub enum CsvBarError {
    #[error("csv I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct BarRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<&Bar> for BarRow {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

impl From<BarRow> for Bar {
    fn from(row: BarRow) -> Self {
        Self {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, CsvBarError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for row in reader.deserialize::<BarRow>() {
        bars.push(row?.into());
    }
    Ok(bars)
}

pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), CsvBarError> {
    let mut writer = csv::Writer::from_path(path)?;
    for bar in bars {
        writer.serialize(BarRow::from(bar))?;
    }
    writer.flush()?;
    Ok(())
}
