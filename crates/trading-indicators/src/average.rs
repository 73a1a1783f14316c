//! Moving averages over closes.

use trading_core::traits::{Indicator, SeriesIndicator};
use trading_core::types::BarSeries;

use crate::from_end;

/// Simple Moving Average (SMA).
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }
        let n = self.period as f64;
        let mut sum: f64 = data[..self.period].iter().sum();
        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        result.push(sum / n);
        for i in self.period..data.len() {
            sum += data[i] - data[i - self.period];
            result.push(sum / n);
        }
        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

impl SeriesIndicator for Sma {
    fn value_at(&self, series: &BarSeries, offset: usize) -> Option<f64> {
        from_end(&self.calculate(&series.closes()), offset)
    }
}

/// Exponential Moving Average (EMA), seeded with the SMA of the first window.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
        }
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }
        let mut ema = data[..self.period].iter().sum::<f64>() / self.period as f64;
        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        result.push(ema);
        for &price in &data[self.period..] {
            ema += self.alpha * (price - ema);
            result.push(ema);
        }
        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

impl SeriesIndicator for Ema {
    fn value_at(&self, series: &BarSeries, offset: usize) -> Option<f64> {
        from_end(&self.calculate(&series.closes()), offset)
    }
}
