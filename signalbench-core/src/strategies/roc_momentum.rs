//! ROC momentum strategy: rate of change exceeds a threshold.
//!
//! ROC is a percentage: `(close[t] / close[t - period] - 1) * 100`, measured on
//! the window's last bar.

use crate::domain::{Bar, Signal, SignalDirection};
use crate::strategy::{SignalOutput, Strategy};

#[derive(Debug, Clone)]
pub struct RocMomentum {
    pub period: usize,
    pub threshold_pct: f64,
}

impl RocMomentum {
    pub fn new(period: usize, threshold_pct: f64) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(threshold_pct >= 0.0, "threshold_pct must be >= 0");
        Self {
            period,
            threshold_pct,
        }
    }

    pub fn default_params() -> Self {
        Self::new(12, 1.0)
    }
}

impl Strategy for RocMomentum {
    fn name(&self) -> &str {
        "roc_momentum"
    }

    fn generate_signals(&self, _instrument: &str, window: &[Bar]) -> SignalOutput {
        if window.len() <= self.period {
            return Ok(None);
        }
        let cur = window[window.len() - 1].close;
        let base = window[window.len() - 1 - self.period].close;
        if base.is_nan() || base <= 0.0 || cur.is_nan() {
            return Ok(None);
        }
        let roc = (cur / base - 1.0) * 100.0;

        let direction = if roc > self.threshold_pct {
            SignalDirection::Buy
        } else if roc < -self.threshold_pct {
            SignalDirection::Sell
        } else {
            return Ok(None);
        };

        let strength = if self.threshold_pct > 0.0 {
            (roc.abs() / (2.0 * self.threshold_pct)).min(1.0)
        } else {
            1.0
        };

        Ok(Some(
            Signal::new(direction, strength).with_metadata("roc_pct", roc),
        ))
    }
}
