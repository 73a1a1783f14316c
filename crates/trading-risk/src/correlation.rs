//! Rolling Pearson correlation against a primary instrument.

use statrs::statistics::Statistics;
use trading_core::traits::MarketView;

/// Default number of trailing closes correlated.
pub const DEFAULT_WINDOW: usize = 15;

/// Pearson correlation coefficient of two equally long samples.
///
/// Returns `None` for mismatched or too short samples and when either
/// sample has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if !(sx.is_finite() && sy.is_finite()) || sx == 0.0 || sy == 0.0 {
        return None;
    }
    let r = x.iter().covariance(y.iter()) / (sx * sy);
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Coefficients of every basket member against the primary instrument.
///
/// Built fresh for each decision cycle and dropped with it. Members are
/// kept in basket order; members without a full window of data or with a
/// flat price are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationTable {
    primary: String,
    window: usize,
    coefficients: Vec<(String, f64)>,
}

impl CorrelationTable {
    /// Compute the table over the last `window` closes.
    ///
    /// Returns `None` while the primary instrument lacks a full window.
    pub fn compute(
        market: &dyn MarketView,
        primary: &str,
        basket: &[String],
        window: usize,
    ) -> Option<Self> {
        let base = market.trailing_closes(primary, window)?;
        let coefficients = basket
            .iter()
            .filter_map(|symbol| {
                let closes = market.trailing_closes(symbol, window)?;
                Some((symbol.clone(), pearson(&base, &closes)?))
            })
            .collect();

        Some(Self {
            primary: primary.to_string(),
            window,
            coefficients,
        })
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.coefficients
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, r)| *r)
    }

    /// Most correlated member other than `exclude`. Ties go to the member
    /// listed first in the basket.
    pub fn most_correlated(&self, exclude: &str) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (symbol, r) in &self.coefficients {
            if symbol == exclude {
                continue;
            }
            if best.map_or(true, |(_, b)| *r > b) {
                best = Some((symbol.as_str(), *r));
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.coefficients.iter().map(|(s, r)| (s.as_str(), *r))
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::{Bar, MarketSnapshot};

    fn market(series: &[(&str, Vec<f64>)]) -> MarketSnapshot {
        let mut market = MarketSnapshot::new();
        for (symbol, closes) in series {
            for (i, &c) in closes.iter().enumerate() {
                market.update(symbol, Bar::new(i as i64, c, c, c, c, 0.0));
            }
        }
        market
    }

    fn ramp(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    fn basket(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_rejects_flat_or_mismatched() {
        assert!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
    }

    #[test]
    fn test_table_requires_primary_window() {
        let m = market(&[("EURUSD", ramp(1.10, 0.001, 10))]);
        assert!(CorrelationTable::compute(&m, "EURUSD", &basket(&["GBPUSD"]), 15).is_none());
    }

    #[test]
    fn test_table_skips_members_without_data() {
        let m = market(&[
            ("EURUSD", ramp(1.10, 0.001, 15)),
            ("GBPUSD", ramp(1.30, 0.002, 15)),
            ("USDCHF", ramp(0.90, 0.001, 5)),
            ("AUDUSD", vec![0.65; 15]),
        ]);
        let table =
            CorrelationTable::compute(&m, "EURUSD", &basket(&["GBPUSD", "USDCHF", "AUDUSD"]), 15)
                .unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("USDCHF").is_none());
        assert!(table.get("AUDUSD").is_none());
    }

    #[test]
    fn test_selection_excludes_traded_and_breaks_ties_by_order() {
        let m = market(&[
            ("EURUSD", ramp(1.10, 0.001, 15)),
            ("GBPUSD", ramp(1.30, 0.002, 15)),
            ("AUDUSD", ramp(1.30, 0.002, 15)),
            ("USDCHF", ramp(0.95, -0.001, 15)),
        ]);
        let members = basket(&["USDCHF", "GBPUSD", "AUDUSD"]);
        let table = CorrelationTable::compute(&m, "EURUSD", &members, 15).unwrap();

        // GBPUSD and AUDUSD carry identical closes; GBPUSD is listed first
        assert_eq!(table.most_correlated("EURUSD").map(|(s, _)| s), Some("GBPUSD"));
        assert_eq!(table.most_correlated("GBPUSD").map(|(s, _)| s), Some("AUDUSD"));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let wave = |phase: f64| -> Vec<f64> {
            (0..15).map(|i| 1.0 + ((i as f64) * 0.7 + phase).sin() * 0.01).collect()
        };
        let m = market(&[
            ("EURUSD", wave(0.0)),
            ("GBPUSD", wave(0.3)),
            ("AUDUSD", wave(1.5)),
            ("NZDUSD", wave(2.5)),
        ]);
        let members = basket(&["AUDUSD", "GBPUSD", "NZDUSD"]);
        let first = CorrelationTable::compute(&m, "EURUSD", &members, 15).unwrap();
        for _ in 0..5 {
            let again = CorrelationTable::compute(&m, "EURUSD", &members, 15).unwrap();
            assert_eq!(again, first);
            assert_eq!(again.most_correlated("EURUSD"), first.most_correlated("EURUSD"));
        }
        assert_eq!(first.most_correlated("EURUSD").map(|(s, _)| s), Some("GBPUSD"));
    }
}
