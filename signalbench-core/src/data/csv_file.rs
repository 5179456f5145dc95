//! CSV file provider.
//!
//! Layout: one file per instrument and timeframe, `<dir>/<INSTRUMENT>_<tf>.csv`
//! (e.g. `BTC_1H.csv`), with header `timestamp,open,high,low,close,volume` and
//! RFC 3339 timestamps. Only the last `lookback_days` measured back from the
//! newest bar are returned.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<CsvRow> for Bar {
    fn from(row: CsvRow) -> Self {
        Bar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, instrument: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{instrument}_{timeframe}.csv"))
    }

    fn read_all(path: &Path) -> Result<Vec<Bar>, DataError> {
        let display = path.display().to_string();
        let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::Io {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let mut bars = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| DataError::MalformedRow {
                path: display.clone(),
                row: i + 1,
                reason: e.to_string(),
            })?;
            bars.push(Bar::from(row));
        }
        Ok(bars)
    }
}

/// Keep bars within `lookback_days` of the newest timestamp.
fn trim_to_lookback(bars: Vec<Bar>, lookback_days: u32) -> Vec<Bar> {
    let Some(newest) = bars.iter().map(|b| b.timestamp).max() else {
        return bars;
    };
    let cutoff = newest - Duration::days(i64::from(lookback_days));
    bars.into_iter().filter(|b| b.timestamp > cutoff).collect()
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn get_series(
        &self,
        instrument: &str,
        lookback_days: u32,
        timeframe: Timeframe,
    ) -> Result<Option<Vec<Bar>>, DataError> {
        let path = self.path_for(instrument, timeframe);
        if !path.exists() {
            return Ok(None);
        }
        let bars = Self::read_all(&path)?;
        Ok(Some(trim_to_lookback(bars, lookback_days)))
    }
}
