//! Data providers: the seam between the engine and wherever bars come from.

pub mod csv_file;
pub mod provider;
pub mod synthetic;

pub use csv_file::CsvProvider;
pub use provider::{DataError, DataProvider, InMemoryProvider};
pub use synthetic::SyntheticProvider;
