//! In-memory market data snapshot.

use std::collections::HashMap;

use super::{Bar, BarSeries};
use crate::traits::MarketView;

/// Rolling bar history for every instrument seen so far.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    series: HashMap<String, BarSeries>,
    /// Bars kept per instrument (0 = unlimited)
    capacity: usize,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` bars per instrument.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity,
        }
    }

    /// Append a bar to an instrument's history.
    pub fn update(&mut self, symbol: &str, bar: Bar) {
        let capacity = self.capacity;
        self.series
            .entry(symbol.to_string())
            .or_insert_with(|| BarSeries::with_capacity(symbol, capacity))
            .push(bar);
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.series.keys()
    }
}

impl MarketView for MarketSnapshot {
    fn series(&self, symbol: &str) -> Option<&BarSeries> {
        self.series.get(symbol)
    }
}
