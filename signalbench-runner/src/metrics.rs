//! Trade statistics: pure functions over a trade list.
//!
//! Every metric is trade list in, scalar out. The zero-trade case always
//! resolves to 0.0 rather than NaN so results stay comparable.

use serde::{Deserialize, Serialize};
use signalbench_core::Trade;

/// Secondary statistics reported alongside the headline numbers.
///
/// None of these influence the accept/reject decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub total_return: f64,
    pub best_return: f64,
    pub worst_return: f64,
    pub return_std_dev: f64,
    pub profit_factor: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl ReturnStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();
        Self {
            total_return: returns.iter().sum(),
            best_return: returns.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst_return: returns.iter().copied().reduce(f64::min).unwrap_or(0.0),
            return_std_dev: std_dev(&returns),
            profit_factor: profit_factor(trades),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Mean trade return. 0.0 for an empty list.
pub fn average_return(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.return_pct).sum::<f64>() / trades.len() as f64
}

/// Fraction of trades with a strictly positive return. 0.0 for an empty list.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross winning return over gross losing return, capped at 100.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.return_pct > 0.0)
        .map(|t| t.return_pct)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.return_pct < 0.0)
        .map(|t| t.return_pct.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Sample standard deviation (n - 1). 0.0 below two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Longest run of winners (or losers) in trade order. Flat trades break a run.
fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for trade in trades {
        let hit = if winners {
            trade.return_pct > 0.0
        } else {
            trade.return_pct < 0.0
        };
        if hit {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
