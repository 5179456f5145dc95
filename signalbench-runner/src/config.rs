//! Serializable run configuration.
//!
//! Every tunable of a run is explicit here; nothing is read from the process
//! environment. A run file looks like:
//!
//! ```toml
//! [backtest]
//! lookback_days = 3
//! timeframe = "1H"
//! hold_period = 1
//! instruments = ["BTC", "ETH"]
//!
//! [validation]
//! threshold = 0.0
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use signalbench_core::Timeframe;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("hold_period must be >= 1")]
    ZeroHoldPeriod,

    #[error("lookback_days must be >= 1")]
    ZeroLookback,

    #[error("instrument '{0}' is listed more than once")]
    DuplicateInstrument(String),

    #[error("threshold must be a finite number, got {0}")]
    NonFiniteThreshold(f64),
}

/// Parameters of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Days of history requested from the data provider per instrument.
    pub lookback_days: u32,
    pub timeframe: Timeframe,
    /// Bars a simulated position is held before the forced exit.
    pub hold_period: usize,
    pub instruments: Vec<String>,
    /// Evaluate instruments on the rayon pool instead of sequentially.
    #[serde(default)]
    pub parallel: bool,
}

impl BacktestConfig {
    pub fn new(
        instruments: impl IntoIterator<Item = impl Into<String>>,
        lookback_days: u32,
        timeframe: Timeframe,
        hold_period: usize,
    ) -> Self {
        Self {
            lookback_days,
            timeframe,
            hold_period,
            instruments: instruments.into_iter().map(Into::into).collect(),
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check field ranges. An empty instrument list passes here and is
    /// reported by the engine as a run-level failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hold_period == 0 {
            return Err(ConfigError::ZeroHoldPeriod);
        }
        if self.lookback_days == 0 {
            return Err(ConfigError::ZeroLookback);
        }
        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if !seen.insert(instrument.as_str()) {
                return Err(ConfigError::DuplicateInstrument(instrument.clone()));
            }
        }
        Ok(())
    }

    /// Deterministic BLAKE3 fingerprint of the parameters that affect results.
    ///
    /// `parallel` is excluded: serial and parallel runs produce identical results.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.lookback_days.to_le_bytes());
        hasher.update(self.timeframe.label().as_bytes());
        hasher.update(&(self.hold_period as u64).to_le_bytes());
        for instrument in &self.instruments {
            hasher.update(instrument.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Acceptance settings for the validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Average return a strategy must strictly exceed to be accepted.
    #[serde(default)]
    pub threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { threshold: 0.0 }
    }
}

/// Complete run file: backtest parameters plus acceptance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl RunConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest.validate()?;
        if !self.validation.threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(self.validation.threshold));
        }
        Ok(())
    }
}
