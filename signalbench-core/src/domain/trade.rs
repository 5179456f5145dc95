//! Trade: one realized entry/exit pair derived from an accepted signal.

use super::signal::{SignalDirection, SignalMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A simulated round trip: entry at the signal bar's close, exit `hold_period`
/// bars later at that bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub instrument: String,
    pub direction: SignalDirection,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    /// Signed fractional return, positive when the direction was right.
    pub return_pct: f64,

    // ── Signal traceability ──
    pub strength: f64,
    pub metadata: SignalMetadata,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}
