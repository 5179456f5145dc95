//! Walk-forward simulation windows.
//!
//! For a series of N bars and a hold period H, step `i` runs for
//! `i = 0 ..= N - H - 2`: the strategy sees `bars[..=i]`, the position enters
//! at bar `i` and exits at bar `i + H`. A series with `N <= H + 1` produces no
//! steps.

use std::iter::FusedIterator;

use crate::domain::Bar;

/// One simulation step, borrowing from the series.
#[derive(Debug, Clone, Copy)]
pub struct SimulationStep<'a> {
    pub index: usize,
    pub exit_index: usize,
    /// Bars `0..=index`: everything known as of the entry bar.
    pub window: &'a [Bar],
    pub entry: &'a Bar,
    pub exit: &'a Bar,
}

/// Lazy iterator over the simulation steps of one series.
#[derive(Debug, Clone)]
pub struct SimulationWindows<'a> {
    bars: &'a [Bar],
    hold_period: usize,
    next: usize,
    /// One past the last step index.
    end: usize,
}

impl<'a> SimulationWindows<'a> {
    pub fn new(bars: &'a [Bar], hold_period: usize) -> Self {
        Self {
            bars,
            hold_period,
            next: 0,
            end: step_count(bars.len(), hold_period),
        }
    }

    pub fn hold_period(&self) -> usize {
        self.hold_period
    }
}

/// Number of steps a series of `len` bars yields for `hold_period`.
pub fn step_count(len: usize, hold_period: usize) -> usize {
    len.saturating_sub(hold_period + 1)
}

impl<'a> Iterator for SimulationWindows<'a> {
    type Item = SimulationStep<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let exit_index = i + self.hold_period;
        Some(SimulationStep {
            index: i,
            exit_index,
            window: &self.bars[..=i],
            entry: &self.bars[i],
            exit: &self.bars[exit_index],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SimulationWindows<'_> {}

impl FusedIterator for SimulationWindows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(closes: &[f64]) -> Vec<Bar> {
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
                volume: 0.0,
            })
            .collect()
    }

    #[test]
    fn six_bars_hold_one_yields_four_steps() {
        let series = bars(&[100.0, 101.0, 99.0, 105.0, 102.0, 108.0]);
        let steps: Vec<_> = SimulationWindows::new(&series, 1).collect();
        assert_eq!(steps.len(), 4);

        let pairs: Vec<(f64, f64)> = steps.iter().map(|s| (s.entry.close, s.exit.close)).collect();
        assert_eq!(
            pairs,
            vec![(100.0, 101.0), (101.0, 99.0), (99.0, 105.0), (105.0, 102.0)]
        );
    }

    #[test]
    fn window_grows_and_ends_at_entry_bar() {
        let series = bars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        for step in SimulationWindows::new(&series, 2) {
            assert_eq!(step.window.len(), step.index + 1);
            assert_eq!(step.window.last().unwrap().close, step.entry.close);
            assert_eq!(step.exit_index, step.index + 2);
            assert!(step.exit.timestamp > step.window.last().unwrap().timestamp);
        }
    }

    #[test]
    fn short_series_yields_nothing() {
        let series = bars(&[1.0, 2.0, 3.0]);
        assert_eq!(SimulationWindows::new(&series, 2).count(), 0);
        assert_eq!(SimulationWindows::new(&series, 5).count(), 0);
        assert_eq!(SimulationWindows::new(&[], 1).count(), 0);
    }

    #[test]
    fn exact_size_and_fused() {
        let series = bars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut it = SimulationWindows::new(&series, 1);
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
        it.by_ref().for_each(drop);
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }
}
