//! Accept/reject decision over a backtest result.
//!
//! A strategy is accepted iff its average return strictly exceeds the
//! threshold, zero-trade runs included (their average is 0.0). Whether a run
//! produced no trades is reported alongside as a flag for the caller; it
//! never changes the decision.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::runner::BacktestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    BelowThreshold,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::BelowThreshold => "REJECTED (below threshold)",
        }
    }
}

/// Validator output. Carries the result it judged; persisting it is the
/// caller's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub accepted: bool,
    pub verdict: Verdict,
    pub threshold: f64,
    /// The run produced zero trades, usually broken data or a strategy that
    /// never fires. Reporting only.
    pub no_trades: bool,
    pub result: BacktestResult,
}

impl Validation {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn validate(result: BacktestResult, threshold: f64) -> Validation {
    let accepted = result.average_return > threshold;
    let verdict = if accepted {
        Verdict::Accepted
    } else {
        Verdict::BelowThreshold
    };
    let no_trades = result.trade_count == 0;

    info!(
        strategy = %result.strategy,
        average_return = result.average_return,
        threshold,
        verdict = verdict.label(),
        no_trades,
        "validation complete"
    );

    Validation {
        accepted,
        verdict,
        threshold,
        no_trades,
        result,
    }
}
