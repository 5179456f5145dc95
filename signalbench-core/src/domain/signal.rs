//! Signal: a strategy's directional decision at one point in history.
//!
//! Signals are produced "as of bar i, using only bars <= i". They carry no bar
//! index themselves; the engine pairs them with the step that produced them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Buy => "BUY",
            SignalDirection::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalDirection {
    type Err = SignalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(SignalDirection::Buy),
            "SELL" => Ok(SignalDirection::Sell),
            other => Err(SignalParseError::UnknownDirection(other.to_string())),
        }
    }
}

/// Why a strategy's output could not be read as a signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalParseError {
    #[error("signal has no direction")]
    MissingDirection,

    #[error("unknown signal direction '{0}' (expected BUY or SELL)")]
    UnknownDirection(String),

    #[error("invalid signal payload: {0}")]
    InvalidPayload(String),
}

/// A scalar diagnostic value attached to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl MetadataValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::Bool(b) => Some(Self::Flag(b)),
            serde_json::Value::String(s) => Some(Self::Text(s)),
            _ => None,
        }
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl PartialEq<f64> for MetadataValue {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

pub type SignalMetadata = BTreeMap<String, MetadataValue>;

/// A directional trade recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: SignalDirection,
    /// Confidence in [0, 1]. Not used for returns; carried for ranking.
    pub strength: f64,
    /// Diagnostic values surfaced in reports, never interpreted by the engine.
    #[serde(default)]
    pub metadata: SignalMetadata,
}

impl Signal {
    pub fn new(direction: SignalDirection, strength: f64) -> Self {
        Self {
            direction,
            strength,
            metadata: BTreeMap::new(),
        }
    }

    pub fn buy() -> Self {
        Self::new(SignalDirection::Buy, 1.0)
    }

    pub fn sell() -> Self {
        Self::new(SignalDirection::Sell, 1.0)
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Strength forced into [0, 1]; NaN falls back to 1.0. Direction is
    /// never touched.
    pub fn normalized(mut self) -> Self {
        self.strength = if self.strength.is_nan() {
            1.0
        } else {
            self.strength.clamp(0.0, 1.0)
        };
        self
    }
}

/// Loosely-typed signal as emitted by strategies that produce serialized output.
///
/// Every field is optional so that a malformed payload still deserializes and
/// can be rejected with a precise reason instead of a serde error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    #[serde(default)]
    pub direction: Option<String>,
    /// Older payloads name the strength field `signal`.
    #[serde(default, alias = "signal")]
    pub strength: Option<f64>,
    /// Arbitrary JSON; non-scalar entries are dropped on conversion.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl RawSignal {
    /// Parse a JSON payload. `null` means the strategy declined to signal.
    pub fn from_json(payload: &str) -> Result<Option<Self>, SignalParseError> {
        serde_json::from_str::<Option<RawSignal>>(payload)
            .map_err(|e| SignalParseError::InvalidPayload(e.to_string()))
    }

    /// Convert into a typed signal. A missing strength defaults to 1.0.
    /// Only the direction can make a payload malformed; non-scalar metadata
    /// entries are dropped.
    pub fn into_signal(self) -> Result<Signal, SignalParseError> {
        let direction = self
            .direction
            .as_deref()
            .ok_or(SignalParseError::MissingDirection)?
            .parse::<SignalDirection>()?;
        let metadata = self
            .metadata
            .into_iter()
            .filter_map(|(key, value)| MetadataValue::from_json(value).map(|v| (key, v)))
            .collect();
        let signal = Signal {
            direction,
            strength: self.strength.unwrap_or(1.0),
            metadata,
        };
        Ok(signal.normalized())
    }
}

impl TryFrom<RawSignal> for Signal {
    type Error = SignalParseError;

    fn try_from(raw: RawSignal) -> Result<Self, Self::Error> {
        raw.into_signal()
    }
}
