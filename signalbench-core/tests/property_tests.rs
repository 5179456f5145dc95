//! Property tests for core invariants.
//!
//! Uses proptest to verify:
//! 1. Window count: exactly `N - H - 1` steps, none when `N <= H + 1`
//! 2. No look-ahead: every window ends at the entry bar
//! 3. Return formula: BUY and SELL are exact negations
//! 4. Raw signal parsing: only BUY and SELL survive

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use signalbench_core::{
    evaluate_trade, signed_return, step_count, Bar, RawSignal, Signal, SignalDirection,
    SimulationWindows,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..10_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: base + Duration::minutes(15 * i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        })
        .collect()
}

// ── 1. Window count ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn window_count_matches_formula(n in 0usize..200, hold in 1usize..20) {
        let bars = make_bars(&vec![100.0; n]);
        let windows = SimulationWindows::new(&bars, hold);
        let expected = if n <= hold + 1 { 0 } else { n - hold - 1 };
        prop_assert_eq!(windows.len(), expected);
        prop_assert_eq!(windows.count(), expected);
        prop_assert_eq!(step_count(n, hold), expected);
    }

    // ── 2. No look-ahead ─────────────────────────────────────────────

    #[test]
    fn windows_never_include_future_bars(
        closes in prop::collection::vec(arb_price(), 0..80),
        hold in 1usize..6,
    ) {
        let bars = make_bars(&closes);
        for step in SimulationWindows::new(&bars, hold) {
            prop_assert_eq!(step.window.len(), step.index + 1);
            prop_assert_eq!(step.window.last(), Some(step.entry));
            prop_assert_eq!(step.exit_index, step.index + hold);
            prop_assert!(step.exit_index < bars.len() - 1);
            prop_assert!(step.window.iter().all(|b| b.timestamp <= step.entry.timestamp));
        }
    }

    // ── 3. Return formula ────────────────────────────────────────────

    #[test]
    fn buy_and_sell_returns_are_negations(entry in arb_price(), exit in arb_price()) {
        let buy = signed_return(SignalDirection::Buy, entry, exit);
        let sell = signed_return(SignalDirection::Sell, entry, exit);
        prop_assert_eq!(buy, -sell);
        prop_assert!((buy - (exit - entry) / entry).abs() < 1e-12);
        prop_assert_eq!(buy > 0.0, exit > entry);
    }

    #[test]
    fn evaluated_trade_uses_entry_and_exit_closes(
        closes in prop::collection::vec(arb_price(), 3..40),
        hold in 1usize..3,
    ) {
        let bars = make_bars(&closes);
        for step in SimulationWindows::new(&bars, hold) {
            let trade = evaluate_trade("BTC", &Signal::sell(), &step).unwrap();
            prop_assert_eq!(trade.entry_price, closes[step.index]);
            prop_assert_eq!(trade.exit_price, closes[step.index + hold]);
            prop_assert_eq!(trade.bars_held(), hold);
        }
    }

    // ── 4. Raw signal parsing ────────────────────────────────────────

    #[test]
    fn only_buy_and_sell_parse(direction in "[A-Za-z]{0,6}") {
        let raw = RawSignal {
            direction: Some(direction.clone()),
            ..RawSignal::default()
        };
        let parsed = raw.into_signal();
        prop_assert_eq!(parsed.is_ok(), direction == "BUY" || direction == "SELL");
    }
}

#[test]
fn hand_checked_returns() {
    assert!((signed_return(SignalDirection::Buy, 100.0, 110.0) - 0.10).abs() < 1e-12);
    assert!((signed_return(SignalDirection::Sell, 100.0, 110.0) + 0.10).abs() < 1e-12);
}
