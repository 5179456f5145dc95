//! Synthetic series for development runs and benchmarks.
//!
//! Produces a simple random walk from a starting price of 100.0, seeded from
//! the instrument name and timeframe so the same request always yields the
//! same bars. These are clearly fake and only meant for smoke-testing a
//! strategy end to end without a data export.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    /// Timestamp of the newest generated bar.
    anchor: DateTime<Utc>,
    /// Maximum absolute per-bar return.
    max_step: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            anchor: Utc
                .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            max_step: 0.01,
        }
    }
}

impl SyntheticProvider {
    pub fn new(anchor: DateTime<Utc>, max_step: f64) -> Self {
        assert!(
            max_step > 0.0 && max_step < 1.0,
            "max_step must be in (0, 1)"
        );
        Self { anchor, max_step }
    }

    pub fn generate(
        &self,
        instrument: &str,
        lookback_days: u32,
        timeframe: Timeframe,
    ) -> Vec<Bar> {
        let seed_input = format!("{instrument}:{timeframe}");
        let seed: [u8; 32] = *blake3::hash(seed_input.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let n = timeframe.bars_in_days(lookback_days);
        let step = timeframe.duration();
        let start = self.anchor - step * (n.saturating_sub(1) as i32);

        let mut bars = Vec::with_capacity(n);
        let mut price = 100.0_f64;
        for i in 0..n {
            let bar_return: f64 = rng.gen_range(-self.max_step..self.max_step);
            let open = price;
            let close = price * (1.0 + bar_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..self.max_step / 2.0));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..self.max_step / 2.0));
            let volume = rng.gen_range(500.0..5_000.0);

            bars.push(Bar {
                timestamp: start + step * (i as i32),
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn get_series(
        &self,
        instrument: &str,
        lookback_days: u32,
        timeframe: Timeframe,
    ) -> Result<Option<Vec<Bar>>, DataError> {
        Ok(Some(self.generate(instrument, lookback_days, timeframe)))
    }
}
