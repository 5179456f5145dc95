//! SignalBench Runner: backtest orchestration, validation and run configuration.
//!
//! This crate builds on `signalbench-core` to provide:
//! - TOML run configuration with fingerprinting
//! - The per-instrument backtest engine (serial or rayon-parallel)
//! - Trade statistics
//! - The threshold validator
//! - A name-based strategy registry for the CLI

pub mod config;
pub mod metrics;
pub mod registry;
pub mod runner;
pub mod validation;

pub use config::{BacktestConfig, ConfigError, RunConfig, ValidationConfig};
pub use metrics::ReturnStats;
pub use registry::{RegistryError, StrategyParams, StrategyRegistry};
pub use runner::{
    BacktestEngine, BacktestResult, InstrumentReport, InstrumentStatus, RunDiagnostics, RunError,
};
pub use validation::{validate, Validation, Verdict};
