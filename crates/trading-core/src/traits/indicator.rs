//! Indicator trait definitions.

use crate::error::IndicatorError;
use crate::types::BarSeries;

/// Batch indicator over a price slice.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data, one per full window.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Indicator read directly from a bar series.
///
/// Values are addressed by relative bar offset (0 = current bar). A missing
/// value means the indicator is not ready at that offset.
pub trait SeriesIndicator: Send + Sync {
    /// Value at `offset` bars back.
    fn value_at(&self, series: &BarSeries, offset: usize) -> Option<f64>;

    /// Check if the indicator has a value for the current bar.
    fn is_ready(&self, series: &BarSeries) -> bool {
        self.value_at(series, 0).is_some()
    }

    /// Current value.
    fn current(&self, series: &BarSeries) -> Option<f64> {
        self.value_at(series, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;

    struct RollingSum {
        period: usize,
    }

    impl Indicator for RollingSum {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            data.windows(self.period).map(|w| w.iter().sum()).collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "sum"
        }
    }

    impl SeriesIndicator for RollingSum {
        fn value_at(&self, series: &BarSeries, offset: usize) -> Option<f64> {
            let values = self.calculate(&series.closes());
            let index = values.len().checked_sub(offset + 1)?;
            values.get(index).copied()
        }
    }

    #[test]
    fn test_indicator_validation() {
        let indicator = RollingSum { period: 5 };

        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
    }

    #[test]
    fn test_series_offsets_and_readiness() {
        let indicator = RollingSum { period: 3 };
        let mut series = BarSeries::new("EURUSD");
        series.extend((1..=2).map(|i| Bar::new(i, 1.0, 1.0, 1.0, i as f64, 0.0)));
        assert!(!indicator.is_ready(&series));

        series.extend((3..=5).map(|i| Bar::new(i, 1.0, 1.0, 1.0, i as f64, 0.0)));
        assert_eq!(indicator.current(&series), Some(12.0)); // 3+4+5
        assert_eq!(indicator.value_at(&series, 2), Some(6.0)); // 1+2+3
        assert!(indicator.value_at(&series, 3).is_none());
    }
}
