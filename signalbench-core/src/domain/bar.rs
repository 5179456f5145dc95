//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single instrument at one timeframe step.
///
/// Only `close` drives the simulation. The other columns are carried through
/// untouched so strategies and reports can use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Structural problems with a bar series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index} at {timestamp} is not after the previous bar")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("duplicate timestamp {timestamp} at bar {index}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Check that a series is strictly ascending by timestamp.
///
/// Price quality is not checked here: a non-positive close is a per-step
/// problem handled by the trade evaluator, not a reason to drop the series.
pub fn validate_series(bars: &[Bar]) -> Result<(), BarError> {
    for (index, pair) in bars.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.timestamp == prev.timestamp {
            return Err(BarError::DuplicateTimestamp {
                index: index + 1,
                timestamp: cur.timestamp,
            });
        }
        if cur.timestamp < prev.timestamp {
            return Err(BarError::OutOfOrder {
                index: index + 1,
                timestamp: cur.timestamp,
            });
        }
    }
    Ok(())
}
