//! Open-interest momentum: combines open-interest spikes with short-term
//! price momentum.
//!
//! BUY when open interest grew by more than `oi_threshold_pct` between the two
//! latest samples and price rose over the last four bars; SELL on the mirror
//! case. The open-interest feed is read-only auxiliary data, queried as of the
//! window's last timestamp so it cannot leak future samples.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DataError;
use crate::domain::{Bar, Signal, SignalDirection};
use crate::strategy::{SignalOutput, Strategy, StrategyError};

/// Bars spanned by the price-change leg (last close vs. four bars earlier).
const PRICE_LOOKBACK_BARS: usize = 5;

/// OI change (in percent) that maps to full signal strength.
const FULL_STRENGTH_OI_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestSample {
    pub timestamp: DateTime<Utc>,
    pub total_oi: f64,
}

/// Read-only source of open-interest history.
pub trait OpenInterestFeed: Send + Sync {
    /// Ascending samples for `instrument` with `timestamp <= as_of`.
    fn history(
        &self,
        instrument: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<OpenInterestSample>, DataError>;
}

/// Open-interest history held in memory, keyed by instrument.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOpenInterest {
    series: HashMap<String, Vec<OpenInterestSample>>,
}

impl InMemoryOpenInterest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(
        mut self,
        instrument: impl Into<String>,
        mut samples: Vec<OpenInterestSample>,
    ) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        self.series.insert(instrument.into(), samples);
        self
    }
}

impl OpenInterestFeed for InMemoryOpenInterest {
    fn history(
        &self,
        instrument: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<OpenInterestSample>, DataError> {
        Ok(self
            .series
            .get(instrument)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.timestamp <= as_of)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("oi_threshold_pct must be a finite number >= 0, got {0}")]
pub struct InvalidThreshold(pub f64);

pub struct OpenInterestMomentum<F> {
    feed: F,
    pub oi_threshold_pct: f64,
}

impl<F: OpenInterestFeed> OpenInterestMomentum<F> {
    pub fn new(feed: F) -> Self {
        Self::with_threshold(feed, 1.0)
    }

    /// Panics on a negative or non-finite threshold. Use
    /// [`try_with_threshold`](Self::try_with_threshold) for untrusted input.
    pub fn with_threshold(feed: F, oi_threshold_pct: f64) -> Self {
        assert!(
            oi_threshold_pct.is_finite() && oi_threshold_pct >= 0.0,
            "oi_threshold_pct must be a finite number >= 0"
        );
        Self {
            feed,
            oi_threshold_pct,
        }
    }

    pub fn try_with_threshold(feed: F, oi_threshold_pct: f64) -> Result<Self, InvalidThreshold> {
        if !(oi_threshold_pct.is_finite() && oi_threshold_pct >= 0.0) {
            return Err(InvalidThreshold(oi_threshold_pct));
        }
        Ok(Self {
            feed,
            oi_threshold_pct,
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl<F: OpenInterestFeed> Strategy for OpenInterestMomentum<F> {
    fn name(&self) -> &str {
        "open_interest_momentum"
    }

    fn generate_signals(&self, instrument: &str, window: &[Bar]) -> SignalOutput {
        let Some(last) = window.last() else {
            return Ok(None);
        };
        if window.len() < PRICE_LOOKBACK_BARS {
            return Ok(None);
        }

        let history = self
            .feed
            .history(instrument, last.timestamp)
            .map_err(|e| StrategyError::AuxiliaryData(e.to_string()))?;
        let [.., previous, recent] = history.as_slice() else {
            return Ok(None);
        };
        if previous.total_oi == 0.0 {
            return Ok(None);
        }
        let oi_change = (recent.total_oi - previous.total_oi) / previous.total_oi * 100.0;

        let price_change = last.close - window[window.len() - PRICE_LOOKBACK_BARS].close;

        let direction = if oi_change > self.oi_threshold_pct && price_change > 0.0 {
            SignalDirection::Buy
        } else if oi_change < -self.oi_threshold_pct && price_change < 0.0 {
            SignalDirection::Sell
        } else {
            return Ok(None);
        };

        let strength = round_to((oi_change.abs() / FULL_STRENGTH_OI_PCT).min(1.0), 2);
        Ok(Some(
            Signal::new(direction, strength)
                .with_metadata("oi_change_pct", round_to(oi_change, 2))
                .with_metadata("price_change", round_to(price_change, 4)),
        ))
    }
}
