//! Integration tests for the backtest engine: end-to-end runs over in-memory
//! and synthetic data, fault isolation and validation.

use chrono::{Duration, TimeZone, Utc};
use signalbench_core::data::{DataError, InMemoryProvider, SyntheticProvider};
use signalbench_core::strategies::{
    InMemoryOpenInterest, MaCrossover, OpenInterestMomentum, OpenInterestSample,
};
use signalbench_core::{
    Bar, InstrumentOnly, MetadataValue, RawSignal, Signal, SignalDirection, SignalOutput, Strategy,
    StrategyError, Timeframe,
};
use signalbench_runner::{
    validate, BacktestConfig, BacktestEngine, InstrumentStatus, RunError, Verdict,
};

fn bars(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: base + Duration::hours(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
        })
        .collect()
}

fn config(instruments: &[&str], hold_period: usize) -> BacktestConfig {
    BacktestConfig::new(instruments.iter().copied(), 3, Timeframe::H1, hold_period)
}

struct AlwaysBuy;

impl Strategy for AlwaysBuy {
    fn name(&self) -> &str {
        "always_buy"
    }

    fn generate_signals(&self, _instrument: &str, _window: &[Bar]) -> SignalOutput {
        Ok(Some(Signal::buy()))
    }
}

/// Emits BUY only when the window has exactly `at_len` bars.
struct BuyAtLength {
    at_len: usize,
}

impl Strategy for BuyAtLength {
    fn name(&self) -> &str {
        "buy_at_length"
    }

    fn generate_signals(&self, _instrument: &str, window: &[Bar]) -> SignalOutput {
        Ok((window.len() == self.at_len).then(Signal::buy))
    }
}

#[test]
fn walk_forward_scenario_matches_hand_computation() {
    let provider = InMemoryProvider::new()
        .with_series("BTC", bars(&[100.0, 101.0, 99.0, 105.0, 102.0, 108.0]));
    let result = BacktestEngine::new(&provider)
        .run(&AlwaysBuy, &config(&["BTC"], 1))
        .unwrap();

    assert_eq!(result.trade_count, 4);
    let expected = [0.01, -2.0 / 101.0, 6.0 / 99.0, -3.0 / 105.0];
    for (trade, want) in result.trades.iter().zip(expected) {
        assert!((trade.return_pct - want).abs() < 1e-12);
    }
    assert!((result.average_return - 0.005558).abs() < 1e-5);
    assert_eq!(result.win_rate, 0.5);

    // The fifth bar's close only ever appears as an exit price.
    let entry_indices: Vec<usize> = result.trades.iter().map(|t| t.entry_index).collect();
    assert_eq!(entry_indices, vec![0, 1, 2, 3]);
    assert_eq!(result.trades[3].exit_index, 4);
}

#[test]
fn sell_signals_invert_returns() {
    struct AlwaysSell;
    impl Strategy for AlwaysSell {
        fn name(&self) -> &str {
            "always_sell"
        }
        fn generate_signals(&self, _: &str, _: &[Bar]) -> SignalOutput {
            Ok(Some(Signal::sell()))
        }
    }

    let provider = InMemoryProvider::new().with_series("BTC", bars(&[100.0, 110.0, 110.0]));
    let result = BacktestEngine::new(&provider)
        .run(&AlwaysSell, &config(&["BTC"], 1))
        .unwrap();
    assert_eq!(result.trade_count, 1);
    assert!((result.average_return + 0.10).abs() < 1e-12);
    assert_eq!(result.trades[0].direction, SignalDirection::Sell);
}

#[test]
fn empty_instrument_does_not_affect_valid_one() {
    let provider = InMemoryProvider::new()
        .with_series("EMPTY", Vec::new())
        .with_series("BTC", bars(&[100.0, 102.0, 104.0, 106.0, 108.0]));
    let result = BacktestEngine::new(&provider)
        .run(&BuyAtLength { at_len: 3 }, &config(&["EMPTY", "BTC"], 1))
        .unwrap();

    assert_eq!(result.trade_count, 1);
    let trade = &result.trades[0];
    assert_eq!(trade.instrument, "BTC");
    assert_eq!((trade.entry_price, trade.exit_price), (104.0, 106.0));
    assert_eq!(result.average_return, trade.return_pct);
    assert_eq!(result.win_rate, 1.0);
    assert_eq!(result.instruments[0].status, InstrumentStatus::NoData);
    assert_eq!(result.diagnostics.instruments_unavailable, 1);
}

#[test]
fn zero_trades_yields_zero_sentinels() {
    let provider = InMemoryProvider::new().with_series("BTC", bars(&[100.0, 101.0, 102.0]));
    let result = BacktestEngine::new(&provider)
        .run(&BuyAtLength { at_len: 99 }, &config(&["BTC", "UNKNOWN"], 1))
        .unwrap();
    assert_eq!(result.trade_count, 0);
    assert_eq!(result.average_return, 0.0);
    assert_eq!(result.win_rate, 0.0);
    assert!(result.average_return.is_finite());

    let validation = validate(result.clone(), 0.0);
    assert!(!validation.accepted);
    assert!(validation.no_trades);

    // A negative threshold accepts the zero average like any other.
    let validation = validate(result, -0.01);
    assert!(validation.accepted);
    assert_eq!(validation.verdict, Verdict::Accepted);
    assert!(validation.no_trades);
}

#[test]
fn empty_instrument_list_is_run_error() {
    let provider = InMemoryProvider::new();
    let err = BacktestEngine::new(&provider)
        .run(&AlwaysBuy, &config(&[], 1))
        .unwrap_err();
    assert!(matches!(err, RunError::EmptyInstrumentList));
}

#[test]
fn provider_down_for_every_instrument_is_run_error() {
    let provider = InMemoryProvider::new()
        .with_failure("BTC", DataError::NetworkUnreachable("connection refused".into()));
    let err = BacktestEngine::new(&provider)
        .run(&AlwaysBuy, &config(&["BTC"], 1))
        .unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn strategy_errors_and_panics_are_isolated_per_step() {
    struct Flaky;
    impl Strategy for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }
        fn generate_signals(&self, _: &str, window: &[Bar]) -> SignalOutput {
            match window.len() % 3 {
                0 => panic!("indicator blew up"),
                1 => Err(StrategyError::Failed("upstream timeout".into())),
                _ => Ok(Some(Signal::buy())),
            }
        }
    }

    let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
    let provider = InMemoryProvider::new().with_series("BTC", bars(&closes));
    let result = BacktestEngine::new(&provider)
        .run(&Flaky, &config(&["BTC"], 1))
        .unwrap();

    // Steps 0..=7, window lengths 1..=8.
    assert_eq!(result.diagnostics.steps_evaluated, 8);
    assert_eq!(result.diagnostics.strategy_faults, 5);
    assert_eq!(result.trade_count, 3);
    assert_eq!(result.win_rate, 1.0);
}

#[test]
fn malformed_signals_count_as_no_signal() {
    struct Noisy;
    impl Strategy for Noisy {
        fn name(&self) -> &str {
            "noisy"
        }
        fn generate_signals(&self, _: &str, window: &[Bar]) -> SignalOutput {
            let payload = if window.len() == 1 {
                r#"{"direction": "HOLD", "signal": 0.5}"#
            } else if window.len() == 2 {
                r#"{"strength": 0.5}"#
            } else {
                r#"{"direction": "SELL", "strength": 7.0, "metadata": {"note": "spike"}}"#
            };
            let raw = RawSignal::from_json(payload)?;
            Ok(raw.map(RawSignal::into_signal).transpose()?)
        }
    }

    let provider = InMemoryProvider::new().with_series("BTC", bars(&[1.0, 2.0, 3.0, 4.0, 5.0]));
    let result = BacktestEngine::new(&provider)
        .run(&Noisy, &config(&["BTC"], 1))
        .unwrap();
    assert_eq!(result.diagnostics.malformed_signals, 2);
    assert_eq!(result.diagnostics.strategy_faults, 0);

    // Odd strength and text metadata never cost a well-formed direction.
    assert_eq!(result.trade_count, 1);
    let trade = &result.trades[0];
    assert_eq!(trade.direction, SignalDirection::Sell);
    assert_eq!(trade.strength, 1.0);
    assert_eq!(trade.metadata["note"], MetadataValue::Text("spike".into()));
    assert!((trade.return_pct + 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn out_of_range_strength_still_trades() {
    struct Overconfident;
    impl Strategy for Overconfident {
        fn name(&self) -> &str {
            "overconfident"
        }
        fn generate_signals(&self, _: &str, _: &[Bar]) -> SignalOutput {
            Ok(Some(Signal::new(SignalDirection::Buy, 1.5)))
        }
    }

    let provider = InMemoryProvider::new().with_series("BTC", bars(&[100.0, 110.0, 120.0]));
    let result = BacktestEngine::new(&provider)
        .run(&Overconfident, &config(&["BTC"], 1))
        .unwrap();
    assert_eq!(result.trade_count, 1);
    assert_eq!(result.diagnostics.malformed_signals, 0);
    assert_eq!(result.trades[0].strength, 1.0);
    assert!((result.average_return - 0.10).abs() < 1e-12);
}

#[test]
fn legacy_strategy_runs_without_window() {
    let legacy = InstrumentOnly::new("legacy_eth_bull", |instrument: &str| {
        Ok((instrument == "ETH").then(Signal::buy))
    });
    let provider = InMemoryProvider::new()
        .with_series("BTC", bars(&[100.0, 90.0, 80.0, 70.0]))
        .with_series("ETH", bars(&[100.0, 110.0, 121.0, 133.1]));
    let result = BacktestEngine::new(&provider)
        .run(&legacy, &config(&["BTC", "ETH"], 1))
        .unwrap();
    assert_eq!(result.trade_count, 2);
    assert!(result.trades.iter().all(|t| t.instrument == "ETH"));
    assert!((result.average_return - 0.10).abs() < 1e-12);
}

#[test]
fn open_interest_strategy_end_to_end() {
    let series = bars(&[100.0, 100.5, 101.0, 101.5, 102.0, 103.0, 104.0]);
    let samples = series
        .iter()
        .enumerate()
        .map(|(i, bar)| OpenInterestSample {
            timestamp: bar.timestamp,
            // Flat until bar 4, then a 2% jump.
            total_oi: if i < 4 { 1000.0 } else { 1020.0 },
        })
        .collect();
    let feed = InMemoryOpenInterest::new().with_series("BTC", samples);
    let strategy = OpenInterestMomentum::new(feed);

    let provider = InMemoryProvider::new().with_series("BTC", series);
    let result = BacktestEngine::new(&provider)
        .run(&strategy, &config(&["BTC"], 1))
        .unwrap();

    // Only the step at bar 4 sees the OI jump between its two latest samples.
    assert_eq!(result.trade_count, 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_index, 4);
    assert_eq!(trade.strength, 0.4);
    assert_eq!(trade.metadata["oi_change_pct"], 2.0);
    assert_eq!(result.strategy, "open_interest_momentum");
}

#[test]
fn serial_and_parallel_runs_are_identical() {
    let provider = SyntheticProvider::default();
    let strategy = MaCrossover::new(3, 8);
    let instruments = ["BTC", "ETH", "SOL", "ARB", "OP", "DOGE", "AVAX", "LINK"];
    let serial = BacktestConfig::new(instruments, 5, Timeframe::H1, 2);
    let parallel = serial.clone().with_parallel(true);

    let engine = BacktestEngine::new(&provider);
    let a = engine.run(&strategy, &serial).unwrap();
    let b = engine.run(&strategy, &serial).unwrap();
    let c = engine.run(&strategy, &parallel).unwrap();

    assert!(a.trade_count > 0);
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(a.average_return.to_bits(), c.average_return.to_bits());
    let order: Vec<&str> = c.instruments.iter().map(|r| r.instrument.as_str()).collect();
    assert_eq!(order, instruments);
}

#[test]
fn validator_boundary_on_real_result() {
    let provider = InMemoryProvider::new().with_series("BTC", bars(&[100.0, 101.0, 102.01]));
    let result = BacktestEngine::new(&provider)
        .run(&AlwaysBuy, &config(&["BTC"], 1))
        .unwrap();
    let avg = result.average_return;

    assert!(!validate(result.clone(), avg).accepted);
    assert!(validate(result.clone(), avg - 1e-9).accepted);
    assert_eq!(validate(result, 0.02).verdict, Verdict::BelowThreshold);
}

#[test]
fn result_serializes_with_fingerprint() {
    let provider = InMemoryProvider::new().with_series("BTC", bars(&[100.0, 101.0, 102.0]));
    let cfg = config(&["BTC"], 1);
    let result = BacktestEngine::new(&provider).run(&AlwaysBuy, &cfg).unwrap();
    assert_eq!(result.config_fingerprint, cfg.fingerprint());

    let json = serde_json::to_string(&result).unwrap();
    let back: signalbench_runner::BacktestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.trade_count, result.trade_count);
    assert_eq!(back.instruments[0].status, InstrumentStatus::Evaluated);
}
