//! Trade evaluation: turns an accepted signal and its entry/exit bars into a
//! realized, direction-adjusted return.

use thiserror::Error;

use crate::domain::{Signal, SignalDirection, Trade};
use crate::window::SimulationStep;

/// Price data that cannot produce a meaningful return.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    #[error("non-positive entry price {price} at bar {index}")]
    InvalidEntryPrice { index: usize, price: f64 },

    #[error("non-positive exit price {price} at bar {index}")]
    InvalidExitPrice { index: usize, price: f64 },
}

/// Signed fractional return of a single-direction position.
///
/// Callers must guarantee `entry_price > 0`.
pub fn signed_return(direction: SignalDirection, entry_price: f64, exit_price: f64) -> f64 {
    match direction {
        SignalDirection::Buy => (exit_price - entry_price) / entry_price,
        SignalDirection::Sell => (entry_price - exit_price) / entry_price,
    }
}

/// Build the trade for `signal` emitted at `step`.
pub fn evaluate_trade(
    instrument: &str,
    signal: &Signal,
    step: &SimulationStep<'_>,
) -> Result<Trade, TradeError> {
    let entry_price = step.entry.close;
    let exit_price = step.exit.close;
    let exit_index = step.exit_index;

    if !(entry_price.is_finite() && entry_price > 0.0) {
        return Err(TradeError::InvalidEntryPrice {
            index: step.index,
            price: entry_price,
        });
    }
    if !(exit_price.is_finite() && exit_price > 0.0) {
        return Err(TradeError::InvalidExitPrice {
            index: exit_index,
            price: exit_price,
        });
    }

    Ok(Trade {
        instrument: instrument.to_string(),
        direction: signal.direction,
        entry_index: step.index,
        entry_time: step.entry.timestamp,
        entry_price,
        exit_index,
        exit_time: step.exit.timestamp,
        exit_price,
        return_pct: signed_return(signal.direction, entry_price, exit_price),
        strength: signal.strength,
        metadata: signal.metadata.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::window::SimulationWindows;
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

    fn first_step_trade(closes: &[f64], signal: &Signal) -> Result<Trade, TradeError> {
        let series = bars(closes);
        let step = SimulationWindows::new(&series, 1).next().unwrap();
        evaluate_trade("BTC", signal, &step)
    }

    #[test]
    fn buy_profits_when_price_rises() {
        let trade = first_step_trade(&[100.0, 110.0, 120.0], &Signal::buy()).unwrap();
        assert!((trade.return_pct - 0.10).abs() < 1e-12);
        assert_eq!((trade.entry_index, trade.exit_index), (0, 1));
    }

    #[test]
    fn sell_loses_when_price_rises() {
        let trade = first_step_trade(&[100.0, 110.0, 120.0], &Signal::sell()).unwrap();
        assert!((trade.return_pct + 0.10).abs() < 1e-12);
        assert_eq!(trade.direction, SignalDirection::Sell);
    }

    #[test]
    fn metadata_and_strength_carried_through() {
        let signal = Signal::new(SignalDirection::Buy, 0.3).with_metadata("oi_change_pct", 2.5);
        let trade = first_step_trade(&[50.0, 55.0, 60.0], &signal).unwrap();
        assert_eq!(trade.strength, 0.3);
        assert_eq!(trade.metadata["oi_change_pct"], 2.5);
    }

    #[test]
    fn zero_entry_price_rejected() {
        assert_eq!(
            first_step_trade(&[0.0, 110.0, 120.0], &Signal::buy()),
            Err(TradeError::InvalidEntryPrice {
                index: 0,
                price: 0.0
            })
        );
    }

    #[test]
    fn negative_or_nan_prices_rejected() {
        assert!(first_step_trade(&[-5.0, 110.0, 120.0], &Signal::buy()).is_err());
        assert!(first_step_trade(&[f64::NAN, 110.0, 120.0], &Signal::buy()).is_err());
        assert!(matches!(
            first_step_trade(&[100.0, -1.0, 120.0], &Signal::sell()),
            Err(TradeError::InvalidExitPrice { index: 1, .. })
        ));
    }
}
