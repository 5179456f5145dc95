//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (CSV export, synthetic
//! generator, in-memory fixtures) so the engine never knows where bars came
//! from and tests can inject failures.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Bar, Timeframe};

/// Transport-level failures. "No data" is not an error: providers return
/// `Ok(None)` or an empty series for that.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("I/O error reading {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("malformed row {row} in {path}: {reason}")]
    MalformedRow {
        path: String,
        row: usize,
        reason: String,
    },

    #[error("data error: {0}")]
    Other(String),
}

/// Source of historical bar series.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the most recent `lookback_days` of bars for `instrument`.
    ///
    /// Returns an ascending series, `Ok(None)` when the instrument is unknown,
    /// or `Err` for transport faults.
    fn get_series(
        &self,
        instrument: &str,
        lookback_days: u32,
        timeframe: Timeframe,
    ) -> Result<Option<Vec<Bar>>, DataError>;
}

/// Fixed series held in memory. Instruments can also be scripted to fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, Vec<Bar>>,
    failures: HashMap<String, DataError>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, instrument: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.series.insert(instrument.into(), bars);
        self
    }

    pub fn with_failure(mut self, instrument: impl Into<String>, error: DataError) -> Self {
        self.failures.insert(instrument.into(), error);
        self
    }
}

impl DataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    /// Returns the stored series as-is; lookback and timeframe are the
    /// fixture author's responsibility.
    fn get_series(
        &self,
        instrument: &str,
        _lookback_days: u32,
        _timeframe: Timeframe,
    ) -> Result<Option<Vec<Bar>>, DataError> {
        if let Some(err) = self.failures.get(instrument) {
            return Err(err.clone());
        }
        Ok(self.series.get(instrument).cloned())
    }
}
