//! Reference strategies.
//!
//! Each one recomputes everything it needs from the window it is given, so the
//! engine can call it with growing windows in any order.

pub mod ma_crossover;
pub mod open_interest;
pub mod roc_momentum;

pub use ma_crossover::MaCrossover;
pub use open_interest::{
    InMemoryOpenInterest, InvalidThreshold, OpenInterestFeed, OpenInterestMomentum,
    OpenInterestSample,
};
pub use roc_momentum::RocMomentum;

use crate::domain::Bar;

/// Simple moving average of closes over `period` bars ending at `end` (inclusive).
///
/// Returns `None` when the window is too short or contains a NaN close.
pub fn sma_at(bars: &[Bar], period: usize, end: usize) -> Option<f64> {
    if period == 0 || end >= bars.len() || end + 1 < period {
        return None;
    }
    let slice = &bars[end + 1 - period..=end];
    let sum: f64 = slice.iter().map(|b| b.close).sum();
    if sum.is_nan() {
        return None;
    }
    Some(sum / period as f64)
}

#[cfg(test)]
pub(crate) fn test_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: base + Duration::hours(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        })
        .collect()
}
