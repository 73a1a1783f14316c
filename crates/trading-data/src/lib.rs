//! Historical market data loading.

mod csv_source;

pub use csv_source::{read_bars, CsvDataSource};

use std::path::Path;
use trading_core::error::DataError;
use trading_core::types::Bar;

/// Load one instrument's bars from a CSV file.
pub fn load_csv(symbol: &str, path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    CsvDataSource::new(symbol, path)?.load()
}
