//! Price bars and per-instrument bar series.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One OHLCV bar. Prices stay f64 for indicator and correlation math and are
/// converted with [`to_price`] where they end up in an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Every price finite and positive.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

/// Decimal places kept when converting f64 prices; drops binary float noise.
pub const PRICE_DP: u32 = 10;

/// Convert an f64 price to Decimal, rounded to [`PRICE_DP`] places.
pub fn to_price(value: f64) -> Decimal {
    Decimal::try_from(value)
        .map(|d| d.round_dp(PRICE_DP))
        .unwrap_or_default()
}

/// Rolling window of one instrument's bars, oldest first.
///
/// A window of 0 keeps every bar; otherwise the oldest bar is evicted once
/// the window is full.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub symbol: String,
    bars: VecDeque<Bar>,
    window: usize,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_capacity(symbol, 0)
    }

    /// Series that keeps at most `window` bars.
    pub fn with_capacity(symbol: impl Into<String>, window: usize) -> Self {
        Self {
            symbol: symbol.into(),
            bars: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn push(&mut self, bar: Bar) {
        if self.window != 0 && self.bars.len() == self.window {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
    }

    pub fn extend(&mut self, bars: impl IntoIterator<Item = Bar>) {
        bars.into_iter().for_each(|bar| self.push(bar));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Bar `offset` steps back from the most recent one (0 = most recent).
    pub fn at_offset(&self, offset: usize) -> Option<&Bar> {
        let index = self.bars.len().checked_sub(offset + 1)?;
        self.bars.get(index)
    }

    /// Closes of the most recent `n` bars, oldest first. `None` while fewer
    /// than `n` bars are held.
    pub fn trailing_closes(&self, n: usize) -> Option<Vec<f64>> {
        if n == 0 || n > self.bars.len() {
            return None;
        }
        Some(self.bars.range(self.bars.len() - n..).map(|b| b.close).collect())
    }

    fn column(&self, field: impl Fn(&Bar) -> f64) -> Vec<f64> {
        self.bars.iter().map(field).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.column(|b| b.close)
    }

    pub fn highs(&self) -> Vec<f64> {
        self.column(|b| b.high)
    }

    pub fn lows(&self) -> Vec<f64> {
        self.column(|b| b.low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_validity() {
        assert!(Bar::new(1, 1.1, 1.2, 1.0, 1.15, 0.0).is_valid());
        assert!(!Bar::new(1, 1.1, 1.2, 1.0, f64::NAN, 0.0).is_valid());
        assert!(!Bar::new(1, 0.0, 1.2, 1.0, 1.1, 0.0).is_valid());
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut series = BarSeries::with_capacity("EURUSD", 3);
        series.extend((1..=4).map(|i| Bar::new(i, 1.1, 1.1, 1.1, 1.1, 0.0)));

        assert_eq!(series.len(), 3);
        assert_eq!(series.at_offset(2).map(|b| b.timestamp), Some(2));
        assert_eq!(series.last().map(|b| b.timestamp), Some(4));
    }

    #[test]
    fn test_offsets_and_trailing_closes() {
        let mut series = BarSeries::new("EURUSD");
        series.extend((0..5).map(|i| Bar::new(i, 1.0, 1.0, 1.0, 1.0 + i as f64, 0.0)));

        assert_eq!(series.at_offset(0).unwrap().timestamp, 4);
        assert_eq!(series.at_offset(4).unwrap().timestamp, 0);
        assert!(series.at_offset(5).is_none());

        assert_eq!(series.trailing_closes(3), Some(vec![3.0, 4.0, 5.0]));
        assert!(series.trailing_closes(6).is_none());
        assert!(series.trailing_closes(0).is_none());
    }

    #[test]
    fn test_to_price_drops_float_noise() {
        assert_eq!(to_price(1.1 + 0.0005), rust_decimal_macros::dec!(1.1005));
        assert_eq!(to_price(f64::NAN), Decimal::ZERO);
    }
}
