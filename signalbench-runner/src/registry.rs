//! Strategy registry: maps names to factories returning `Box<dyn Strategy>`.
//!
//! The engine only ever sees `&dyn Strategy`; turning a name from the command
//! line into an instance happens here. Factories read named numeric
//! parameters, falling back to each strategy's defaults.

use std::collections::BTreeMap;

use signalbench_core::strategies::{MaCrossover, RocMomentum};
use signalbench_core::Strategy;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("invalid parameters for '{strategy}': {reason}")]
    InvalidParams { strategy: String, reason: String },
}

/// Named numeric parameters passed to a factory.
pub type StrategyParams = BTreeMap<String, f64>;

type Factory = fn(&StrategyParams) -> Result<Box<dyn Strategy>, RegistryError>;

/// Static table of strategy factories, kept in registration order.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: Vec<(&'static str, Factory)>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every strategy that needs nothing beyond price bars.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("ma_crossover", build_ma_crossover);
        registry.register("roc_momentum", build_roc_momentum);
        registry
    }

    /// Register `factory` under `name`, replacing any earlier entry.
    pub fn register(&mut self, name: &'static str, factory: Factory) {
        match self.factories.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((name, factory)),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|(name, _)| *name).collect()
    }

    pub fn create(
        &self,
        name: &str,
        params: &StrategyParams,
    ) -> Result<Box<dyn Strategy>, RegistryError> {
        let (_, factory) = self
            .factories
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| RegistryError::UnknownStrategy(name.to_string()))?;
        factory(params)
    }
}

fn param(params: &StrategyParams, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

fn param_usize(
    strategy: &str,
    params: &StrategyParams,
    name: &str,
    default: usize,
) -> Result<usize, RegistryError> {
    match params.get(name) {
        None => Ok(default),
        Some(&v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 => Ok(v as usize),
        Some(&v) => Err(RegistryError::InvalidParams {
            strategy: strategy.to_string(),
            reason: format!("{name} must be a positive integer, got {v}"),
        }),
    }
}

fn build_ma_crossover(params: &StrategyParams) -> Result<Box<dyn Strategy>, RegistryError> {
    let defaults = MaCrossover::default_params();
    let fast = param_usize("ma_crossover", params, "fast_period", defaults.fast_period)?;
    let slow = param_usize("ma_crossover", params, "slow_period", defaults.slow_period)?;
    if slow <= fast {
        return Err(RegistryError::InvalidParams {
            strategy: "ma_crossover".into(),
            reason: format!("slow_period ({slow}) must be > fast_period ({fast})"),
        });
    }
    Ok(Box::new(MaCrossover::new(fast, slow)))
}

fn build_roc_momentum(params: &StrategyParams) -> Result<Box<dyn Strategy>, RegistryError> {
    let defaults = RocMomentum::default_params();
    let period = param_usize("roc_momentum", params, "period", defaults.period)?;
    let threshold_pct = param(params, "threshold_pct", defaults.threshold_pct);
    if !(threshold_pct.is_finite() && threshold_pct > 0.0) {
        return Err(RegistryError::InvalidParams {
            strategy: "roc_momentum".into(),
            reason: format!("threshold_pct must be > 0, got {threshold_pct}"),
        });
    }
    Ok(Box::new(RocMomentum::new(period, threshold_pct)))
}
