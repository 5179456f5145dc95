//! Domain types for SignalBench

pub mod bar;
pub mod signal;
pub mod timeframe;
pub mod trade;

pub use bar::{validate_series, Bar, BarError};
pub use signal::{
    MetadataValue, RawSignal, Signal, SignalDirection, SignalMetadata, SignalParseError,
};
pub use timeframe::{Timeframe, TimeframeError};
pub use trade::Trade;
