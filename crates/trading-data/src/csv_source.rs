//! CSV bar loader.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trading_core::error::DataError;
use trading_core::types::Bar;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Historical bars of one instrument stored as CSV.
pub struct CsvDataSource {
    symbol: String,
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(symbol: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, DataError> {
        let symbol = symbol.into();
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable(format!(
                "{symbol}: {} does not exist",
                path.display()
            )));
        }
        Ok(Self {
            symbol,
            path: path.to_path_buf(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Load every valid bar, oldest first.
    pub fn load(&self) -> Result<Vec<Bar>, DataError> {
        let reader = std::fs::File::open(&self.path)
            .map_err(|e| DataError::ParseError(format!("{}: {e}", self.path.display())))?;
        let bars = read_bars(&self.symbol, reader)?;
        debug!(symbol = %self.symbol, bars = bars.len(), path = %self.path.display(), "Loaded CSV");
        Ok(bars)
    }
}

/// Parse bars from any CSV reader. Rows with non-positive or non-finite
/// prices are skipped.
pub fn read_bars<R: Read>(symbol: &str, reader: R) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let bar = Bar::new(
            parse_timestamp(&record.date)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        );
        if bar.is_valid() {
            bars.push(bar);
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        warn!(symbol, skipped, "Skipped rows with invalid prices");
    }
    if bars.is_empty() {
        return Err(DataError::NoDataAvailable(symbol.to_string()));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Parse a timestamp in one of the usual formats into Unix milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    const FORMATS: [&str; 5] = [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d-%m-%Y",
    ];

    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix seconds or milliseconds
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {date_str}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("2024-01-15").unwrap(), 1_705_276_800_000);
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000);
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_read_bars_sorts_and_skips_invalid() {
        let data = "\
Date,Open,High,Low,Close,Volume
2024-01-03,1.0950,1.0990,1.0940,1.0980,100
2024-01-02,1.1000,1.1010,1.0940,1.0950,120
2024-01-04,1.0980,1.1000,1.0970,0,90
";
        let bars = read_bars("EURUSD", data.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 1.0950);
    }

    #[test]
    fn test_volume_is_optional() {
        let data = "timestamp,open,high,low,close\n1705312800,1.1,1.2,1.0,1.15\n";
        let bars = read_bars("EURUSD", data.as_bytes()).unwrap();
        assert_eq!(bars[0].volume, 0.0);
    }

    #[test]
    fn test_empty_file_has_no_data() {
        let data = "Date,Open,High,Low,Close\n";
        assert!(matches!(
            read_bars("EURUSD", data.as_bytes()),
            Err(DataError::NoDataAvailable(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvDataSource::new("EURUSD", "/nonexistent/eurusd.csv").is_err());
    }
}
