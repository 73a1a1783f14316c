//! Read access to market data for one decision cycle.

use rust_decimal::Decimal;

use crate::types::{to_price, Bar, BarSeries};

/// Market data as seen by the pipeline.
///
/// Implementations only need to expose the bar series per symbol; the
/// derived lookups have default implementations.
pub trait MarketView: Send + Sync {
    /// Bar series for a symbol, if any bars were received.
    fn series(&self, symbol: &str) -> Option<&BarSeries>;

    /// Bar at a relative offset (0 = current bar).
    fn bar(&self, symbol: &str, offset: usize) -> Option<&Bar> {
        self.series(symbol)?.at_offset(offset)
    }

    /// Close of the current bar, as an order price.
    fn last_close(&self, symbol: &str) -> Option<Decimal> {
        let close = self.bar(symbol, 0)?.close;
        if close.is_finite() && close > 0.0 {
            Some(to_price(close))
        } else {
            None
        }
    }

    /// Last `window` closes, oldest first.
    ///
    /// `None` until the window is full of finite, positive closes.
    fn trailing_closes(&self, symbol: &str, window: usize) -> Option<Vec<f64>> {
        let closes = self.series(symbol)?.trailing_closes(window)?;
        if closes.iter().all(|c| c.is_finite() && *c > 0.0) {
            Some(closes)
        } else {
            None
        }
    }
}
