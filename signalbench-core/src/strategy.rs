//! Strategy capability: produces a signal from a point-in-time view of history.
//!
//! Strategies are read-only with respect to the engine: every method takes
//! `&self` and receives a borrowed window, so a strategy can neither mutate
//! engine-owned bars nor carry hidden state between steps unless it manages
//! interior mutability itself.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Bar, Signal, SignalParseError};

/// Failure raised by a strategy while generating a signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("strategy does not support the {0:?} call form")]
    UnsupportedCallForm(CallForm),

    #[error("window too short: need {needed} bars, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// Strategy produced a payload that is not a valid signal.
    #[error("malformed signal: {0}")]
    MalformedSignal(#[from] SignalParseError),

    #[error("auxiliary data unavailable: {0}")]
    AuxiliaryData(String),

    #[error("strategy failed: {0}")]
    Failed(String),
}

/// What a strategy returns for one step. `Ok(None)` means "no signal".
pub type SignalOutput = Result<Option<Signal>, StrategyError>;

/// How a strategy expects to be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallForm {
    /// `generate_signals(instrument, window)` with the growing history window.
    Windowed,
    /// Legacy form: only the instrument id, the strategy fetches its own data.
    InstrumentOnly,
}

/// Trait for strategies under test.
///
/// # Look-ahead invariant
/// `window` holds bars `0..=i` for the step being evaluated and is never empty.
/// The engine never shows a strategy the entry or exit bar of a later step.
pub trait Strategy: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Call form this strategy supports. Probed once per run.
    fn call_form(&self) -> CallForm {
        CallForm::Windowed
    }

    /// Evaluate the strategy for `instrument` as of the last bar in `window`.
    fn generate_signals(&self, instrument: &str, window: &[Bar]) -> SignalOutput;

    /// Legacy entry point for strategies that ignore the window.
    fn generate_signals_without_window(&self, instrument: &str) -> SignalOutput {
        let _ = instrument;
        Err(StrategyError::UnsupportedCallForm(CallForm::InstrumentOnly))
    }
}

/// Outcome of one fault-isolated strategy call.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSignal {
    Signal(Signal),
    NoSignal,
    Malformed(SignalParseError),
    Fault(String),
}

/// Invokes a strategy once per simulation step with the call form resolved up
/// front, converting errors, panics and malformed signals into "no signal".
pub struct SignalInvoker<'a> {
    strategy: &'a dyn Strategy,
    call_form: CallForm,
}

impl<'a> SignalInvoker<'a> {
    pub fn new(strategy: &'a dyn Strategy) -> Self {
        let call_form = strategy.call_form();
        Self {
            strategy,
            call_form,
        }
    }

    pub fn call_form(&self) -> CallForm {
        self.call_form
    }

    pub fn invoke(&self, instrument: &str, window: &[Bar]) -> StepSignal {
        let strategy = self.strategy;
        let call_form = self.call_form;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match call_form {
            CallForm::Windowed => strategy.generate_signals(instrument, window),
            CallForm::InstrumentOnly => strategy.generate_signals_without_window(instrument),
        }));

        match outcome {
            Ok(Ok(Some(signal))) => {
                let emitted = signal.strength;
                let signal = signal.normalized();
                if signal.strength.to_bits() != emitted.to_bits() {
                    debug!(
                        strategy = strategy.name(),
                        instrument,
                        strength = emitted,
                        "signal strength clamped"
                    );
                }
                StepSignal::Signal(signal)
            }
            Ok(Ok(None)) => StepSignal::NoSignal,
            Ok(Err(StrategyError::MalformedSignal(e))) => StepSignal::Malformed(e),
            Ok(Err(e)) => {
                warn!(strategy = strategy.name(), instrument, error = %e, "strategy call failed");
                StepSignal::Fault(e.to_string())
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(strategy = strategy.name(), instrument, reason = %reason, "strategy panicked");
                StepSignal::Fault(reason)
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "strategy panicked".to_string()
    }
}

/// Adapter for legacy strategies that only take an instrument id.
pub struct InstrumentOnly<F> {
    name: String,
    generate: F,
}

impl<F> InstrumentOnly<F>
where
    F: Fn(&str) -> SignalOutput + Send + Sync,
{
    pub fn new(name: impl Into<String>, generate: F) -> Self {
        Self {
            name: name.into(),
            generate,
        }
    }
}

impl<F> Strategy for InstrumentOnly<F>
where
    F: Fn(&str) -> SignalOutput + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call_form(&self) -> CallForm {
        CallForm::InstrumentOnly
    }

    fn generate_signals(&self, instrument: &str, _window: &[Bar]) -> SignalOutput {
        (self.generate)(instrument)
    }

    fn generate_signals_without_window(&self, instrument: &str) -> SignalOutput {
        (self.generate)(instrument)
    }
}
