//! Moving average crossover strategy: golden cross and death cross detection.
//!
//! Fires BUY when the fast SMA crosses above the slow SMA on the window's last
//! bar, SELL when it crosses below. Both averages are recomputed from the
//! window on every call.

use crate::domain::{Bar, Signal, SignalDirection};
use crate::strategy::{SignalOutput, Strategy};

use super::sma_at;

#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            fast_period,
            slow_period,
        }
    }

    pub fn default_params() -> Self {
        Self::new(5, 20)
    }

    /// Bars needed before a crossover can be detected.
    pub fn warmup_bars(&self) -> usize {
        self.slow_period + 1
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn generate_signals(&self, _instrument: &str, window: &[Bar]) -> SignalOutput {
        if window.len() < self.warmup_bars() {
            return Ok(None);
        }
        let cur = window.len() - 1;
        let prev = cur - 1;

        let values = (
            sma_at(window, self.fast_period, cur),
            sma_at(window, self.slow_period, cur),
            sma_at(window, self.fast_period, prev),
            sma_at(window, self.slow_period, prev),
        );
        let (Some(fast_cur), Some(slow_cur), Some(fast_prev), Some(slow_prev)) = values else {
            return Ok(None);
        };

        let direction = if fast_cur > slow_cur && fast_prev <= slow_prev {
            SignalDirection::Buy
        } else if fast_cur < slow_cur && fast_prev >= slow_prev {
            SignalDirection::Sell
        } else {
            return Ok(None);
        };

        // 1% spread between the averages counts as full conviction.
        let spread = if slow_cur > 0.0 {
            (fast_cur - slow_cur).abs() / slow_cur
        } else {
            0.0
        };
        let strength = (spread * 100.0).min(1.0);

        Ok(Some(
            Signal::new(direction, strength)
                .with_metadata("fast_ma", fast_cur)
                .with_metadata("slow_ma", slow_cur),
        ))
    }
}
