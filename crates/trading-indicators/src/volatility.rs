//! Volatility indicators.

use trading_core::traits::{Indicator, SeriesIndicator};
use trading_core::types::BarSeries;

use crate::{from_end, wilder};

/// Average True Range (ATR) with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Common period is 14.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Calculate ATR from OHLC data. The first bar only seeds the previous
    /// close, so `period + 1` bars are needed for the first value.
    pub fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let len = high.len().min(low.len()).min(close.len());
        if len < self.period + 1 {
            return vec![];
        }

        let tr: Vec<f64> = (1..len)
            .map(|i| {
                let prev = close[i - 1];
                (high[i] - low[i])
                    .max((high[i] - prev).abs())
                    .max((low[i] - prev).abs())
            })
            .collect();

        wilder(&tr, self.period)
    }
}

impl Indicator for Atr {
    type Output = f64;

    /// Close-only approximation: true range degrades to |close - prev close|.
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        self.calculate_ohlc(data, data, data)
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

impl SeriesIndicator for Atr {
    fn value_at(&self, series: &BarSeries, offset: usize) -> Option<f64> {
        let values = self.calculate_ohlc(&series.highs(), &series.lows(), &series.closes());
        from_end(&values, offset)
    }
}
