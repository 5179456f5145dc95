//! Backtest engine: drives a strategy over every configured instrument.
//!
//! Per instrument: fetch the series, walk the simulation windows, ask the
//! strategy for a signal at each step, and turn accepted signals into trades.
//! Instruments are independent: each one produces an owned
//! [`InstrumentOutcome`], and outcomes are merged in configuration order, so a
//! parallel run is bit-identical to a serial one.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use signalbench_core::data::DataProvider;
use signalbench_core::domain::validate_series;
use signalbench_core::{
    evaluate_trade, SignalInvoker, SimulationWindows, StepSignal, Strategy, Trade,
};

use crate::config::{BacktestConfig, ConfigError};
use crate::metrics::{average_return, win_rate, ReturnStats};

/// Failures that abort a whole run. Everything narrower is isolated and
/// counted in [`RunDiagnostics`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("no instruments configured")]
    EmptyInstrumentList,

    #[error("data provider unreachable: all {failures} instrument fetches failed (first: {first_error})")]
    ProviderUnreachable { failures: usize, first_error: String },
}

/// What happened to one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstrumentStatus {
    Evaluated,
    /// Provider had nothing for the instrument.
    NoData,
    /// Fewer than `hold_period + 1` bars.
    TooShort { bars: usize },
    /// Series out of order or with duplicate timestamps.
    InvalidSeries { reason: String },
    /// Transport-level provider error.
    FetchFailed { reason: String },
}

impl InstrumentStatus {
    pub fn is_skipped(&self) -> bool {
        !matches!(self, Self::Evaluated)
    }
}

/// Per-instrument summary for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub instrument: String,
    pub status: InstrumentStatus,
    pub bar_count: usize,
    pub steps: usize,
    pub trade_count: usize,
    pub average_return: f64,
}

/// Counters for everything the engine skipped or degraded instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub instruments_requested: usize,
    pub instruments_evaluated: usize,
    /// Absent, empty, too short or invalid series.
    pub instruments_unavailable: usize,
    pub provider_errors: usize,
    pub steps_evaluated: usize,
    pub signals: usize,
    pub no_signal_steps: usize,
    pub malformed_signals: usize,
    pub strategy_faults: usize,
    pub invalid_price_steps: usize,
}

impl RunDiagnostics {
    fn absorb(&mut self, other: &RunDiagnostics) {
        self.instruments_requested += other.instruments_requested;
        self.instruments_evaluated += other.instruments_evaluated;
        self.instruments_unavailable += other.instruments_unavailable;
        self.provider_errors += other.provider_errors;
        self.steps_evaluated += other.steps_evaluated;
        self.signals += other.signals;
        self.no_signal_steps += other.no_signal_steps;
        self.malformed_signals += other.malformed_signals;
        self.strategy_faults += other.strategy_faults;
        self.invalid_price_steps += other.invalid_price_steps;
    }
}

/// Complete result of a backtest run.
///
/// Only `average_return`, `win_rate` and `trade_count` take part in
/// validation; the rest is for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub config_fingerprint: String,
    /// Mean trade return, 0.0 when there are no trades.
    pub average_return: f64,
    /// Fraction of trades with a positive return, 0.0 when there are no trades.
    pub win_rate: f64,
    pub trade_count: usize,
    pub stats: ReturnStats,
    pub trades: Vec<Trade>,
    pub instruments: Vec<InstrumentReport>,
    pub diagnostics: RunDiagnostics,
}

impl BacktestResult {
    fn from_outcomes(
        strategy: &str,
        config: &BacktestConfig,
        outcomes: Vec<InstrumentOutcome>,
    ) -> Self {
        let mut trades = Vec::new();
        let mut instruments = Vec::with_capacity(outcomes.len());
        let mut diagnostics = RunDiagnostics::default();

        for outcome in outcomes {
            diagnostics.absorb(&outcome.diagnostics);
            instruments.push(InstrumentReport {
                instrument: outcome.instrument,
                status: outcome.status,
                bar_count: outcome.bar_count,
                steps: outcome.diagnostics.steps_evaluated,
                trade_count: outcome.trades.len(),
                average_return: average_return(&outcome.trades),
            });
            trades.extend(outcome.trades);
        }

        Self {
            strategy: strategy.to_string(),
            config_fingerprint: config.fingerprint(),
            average_return: average_return(&trades),
            win_rate: win_rate(&trades),
            trade_count: trades.len(),
            stats: ReturnStats::compute(&trades),
            trades,
            instruments,
            diagnostics,
        }
    }
}

/// Owned result of simulating one instrument.
#[derive(Debug, Clone)]
struct InstrumentOutcome {
    instrument: String,
    status: InstrumentStatus,
    bar_count: usize,
    trades: Vec<Trade>,
    diagnostics: RunDiagnostics,
}

impl InstrumentOutcome {
    fn skipped(instrument: &str, status: InstrumentStatus, bar_count: usize) -> Self {
        let fetch_failed = matches!(status, InstrumentStatus::FetchFailed { .. });
        let diagnostics = RunDiagnostics {
            instruments_requested: 1,
            instruments_unavailable: usize::from(!fetch_failed),
            provider_errors: usize::from(fetch_failed),
            ..RunDiagnostics::default()
        };
        Self {
            instrument: instrument.to_string(),
            status,
            bar_count,
            trades: Vec::new(),
            diagnostics,
        }
    }
}

/// Runs strategies against series from a [`DataProvider`].
pub struct BacktestEngine<'a> {
    provider: &'a dyn DataProvider,
}

impl<'a> BacktestEngine<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self { provider }
    }

    /// Backtest `strategy` over every instrument in `config`.
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        config: &BacktestConfig,
    ) -> Result<BacktestResult, RunError> {
        config.validate()?;
        if config.instruments.is_empty() {
            return Err(RunError::EmptyInstrumentList);
        }

        info!(
            strategy = strategy.name(),
            provider = self.provider.name(),
            instruments = config.instruments.len(),
            hold_period = config.hold_period,
            timeframe = %config.timeframe,
            parallel = config.parallel,
            "backtest started"
        );

        let invoker = SignalInvoker::new(strategy);
        let outcomes: Vec<InstrumentOutcome> = if config.parallel {
            config
                .instruments
                .par_iter()
                .map(|instrument| self.simulate_instrument(&invoker, instrument, config))
                .collect()
        } else {
            config
                .instruments
                .iter()
                .map(|instrument| self.simulate_instrument(&invoker, instrument, config))
                .collect()
        };

        let failures: Vec<&InstrumentStatus> = outcomes
            .iter()
            .map(|o| &o.status)
            .filter(|s| matches!(s, InstrumentStatus::FetchFailed { .. }))
            .collect();
        if failures.len() == outcomes.len() {
            let first_error = match failures.first() {
                Some(InstrumentStatus::FetchFailed { reason }) => reason.clone(),
                _ => String::new(),
            };
            return Err(RunError::ProviderUnreachable {
                failures: failures.len(),
                first_error,
            });
        }

        let result = BacktestResult::from_outcomes(strategy.name(), config, outcomes);
        info!(
            strategy = %result.strategy,
            trades = result.trade_count,
            average_return = result.average_return,
            win_rate = result.win_rate,
            skipped =
                result.diagnostics.instruments_unavailable + result.diagnostics.provider_errors,
            faults = result.diagnostics.strategy_faults,
            "backtest finished"
        );
        Ok(result)
    }

    fn simulate_instrument(
        &self,
        invoker: &SignalInvoker<'_>,
        instrument: &str,
        config: &BacktestConfig,
    ) -> InstrumentOutcome {
        let bars = match self
            .provider
            .get_series(instrument, config.lookback_days, config.timeframe)
        {
            Ok(Some(bars)) if !bars.is_empty() => bars,
            Ok(_) => {
                debug!(instrument, "no data, skipping");
                return InstrumentOutcome::skipped(instrument, InstrumentStatus::NoData, 0);
            }
            Err(e) => {
                warn!(instrument, provider = self.provider.name(), error = %e, "fetch failed, skipping");
                return InstrumentOutcome::skipped(
                    instrument,
                    InstrumentStatus::FetchFailed {
                        reason: e.to_string(),
                    },
                    0,
                );
            }
        };

        if bars.len() <= config.hold_period {
            debug!(
                instrument,
                bars = bars.len(),
                hold_period = config.hold_period,
                "series too short, skipping"
            );
            return InstrumentOutcome::skipped(
                instrument,
                InstrumentStatus::TooShort { bars: bars.len() },
                bars.len(),
            );
        }
        if let Err(e) = validate_series(&bars) {
            debug!(instrument, error = %e, "invalid series, skipping");
            return InstrumentOutcome::skipped(
                instrument,
                InstrumentStatus::InvalidSeries {
                    reason: e.to_string(),
                },
                bars.len(),
            );
        }

        let mut diagnostics = RunDiagnostics {
            instruments_requested: 1,
            instruments_evaluated: 1,
            ..RunDiagnostics::default()
        };
        let mut trades = Vec::new();

        for step in SimulationWindows::new(&bars, config.hold_period) {
            diagnostics.steps_evaluated += 1;
            match invoker.invoke(instrument, step.window) {
                StepSignal::Signal(signal) => {
                    diagnostics.signals += 1;
                    match evaluate_trade(instrument, &signal, &step) {
                        Ok(trade) => trades.push(trade),
                        Err(e) => {
                            debug!(instrument, step = step.index, error = %e, "invalid price, step skipped");
                            diagnostics.invalid_price_steps += 1;
                        }
                    }
                }
                StepSignal::NoSignal => diagnostics.no_signal_steps += 1,
                StepSignal::Malformed(e) => {
                    debug!(instrument, step = step.index, error = %e, "malformed signal ignored");
                    diagnostics.malformed_signals += 1;
                }
                StepSignal::Fault(_) => diagnostics.strategy_faults += 1,
            }
        }

        debug!(
            instrument,
            bars = bars.len(),
            steps = diagnostics.steps_evaluated,
            trades = trades.len(),
            "instrument simulated"
        );

        InstrumentOutcome {
            instrument: instrument.to_string(),
            status: InstrumentStatus::Evaluated,
            bar_count: bars.len(),
            trades,
            diagnostics,
        }
    }
}
