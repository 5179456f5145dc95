//! SignalBench Core: domain types, strategy capability, walk-forward windows, trade evaluation.
//!
//! This crate contains the pieces of the backtest that have no orchestration in them:
//! - Domain types (bars, signals, trades, timeframes)
//! - The `Strategy` capability and the fault-isolating `SignalInvoker`
//! - The walk-forward `SimulationWindows` iterator
//! - The trade evaluator (direction-adjusted returns)
//! - The `DataProvider` seam plus CSV, synthetic and in-memory providers
//! - Reference strategies

pub mod data;
pub mod domain;
pub mod evaluator;
pub mod strategies;
pub mod strategy;
pub mod window;

pub use domain::{
    Bar, MetadataValue, RawSignal, Signal, SignalDirection, SignalMetadata, Timeframe, Trade,
};
pub use evaluator::{evaluate_trade, signed_return, TradeError};
pub use strategy::{
    CallForm, InstrumentOnly, SignalInvoker, SignalOutput, StepSignal, Strategy, StrategyError,
};
pub use window::{step_count, SimulationStep, SimulationWindows};
