//! Technical indicators read by decision modules and sizing policies.
//!
//! - Moving averages (SMA, EMA) on closes
//! - ATR on OHLC bars, used for volatility-adjusted sizing
//! - RSI on closes
//!
//! Every indicator can be computed over a price slice ([`Indicator`]) or
//! read straight from a bar series by relative offset ([`SeriesIndicator`]),
//! where a missing value means "not ready".
//!
//! [`Indicator`]: trading_core::traits::Indicator
//! [`SeriesIndicator`]: trading_core::traits::SeriesIndicator

pub mod average;
pub mod momentum;
pub mod volatility;

pub use average::{Ema, Sma};
pub use momentum::Rsi;
pub use volatility::Atr;

/// Value `offset` steps back from the newest element of an indicator output.
pub(crate) fn from_end(values: &[f64], offset: usize) -> Option<f64> {
    let index = values.len().checked_sub(offset + 1)?;
    values.get(index).copied().filter(|v| v.is_finite())
}

/// Wilder smoothing: seeded with the mean of the first `period` values, then
/// `avg = (avg * (period - 1) + value) / period`.
pub(crate) fn wilder(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return vec![];
    }
    let n = period as f64;
    let seed = values[..period].iter().sum::<f64>() / n;
    std::iter::once(seed)
        .chain(values[period..].iter().scan(seed, |avg, &value| {
            *avg = (*avg * (n - 1.0) + value) / n;
            Some(*avg)
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wilder_smoothing() {
        // seed 2.0, then (2*2 + 6) / 3 = 10/3
        let smoothed = wilder(&[1.0, 2.0, 3.0, 6.0], 3);
        assert_eq!(smoothed.len(), 2);
        assert!((smoothed[1] - 10.0 / 3.0).abs() < 1e-10);
        assert!(wilder(&[1.0], 3).is_empty());
    }

    #[test]
    fn test_from_end_skips_non_finite() {
        assert_eq!(from_end(&[1.0, 2.0], 0), Some(2.0));
        assert_eq!(from_end(&[1.0, f64::NAN], 0), None);
        assert_eq!(from_end(&[1.0], 1), None);
    }
}
