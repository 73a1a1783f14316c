//! Instrument reference data.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TradingError;

/// Quantity step: fractional lots are expressed in hundredths.
pub const LOT_STEP: Decimal = dec!(0.01);

/// Immutable reference data for a tradable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    /// Minimum price increment counted as one pip
    pub pip_size: Decimal,
    /// Monetary value of one pip for one standard lot
    pub pip_value: Decimal,
    /// Smallest order quantity the venue accepts
    #[serde(default = "default_min_quantity")]
    pub min_quantity: Decimal,
}

fn default_min_quantity() -> Decimal {
    LOT_STEP
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, pip_size: Decimal, pip_value: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            pip_size,
            pip_value,
            min_quantity: LOT_STEP,
        }
    }

    pub fn with_min_quantity(mut self, min_quantity: Decimal) -> Self {
        self.min_quantity = min_quantity;
        self
    }

    /// Units of the base asset in one standard lot.
    pub fn contract_size(&self) -> Decimal {
        if self.pip_size.is_zero() {
            return Decimal::ZERO;
        }
        self.pip_value / self.pip_size
    }

    /// Convert a price distance into pips.
    pub fn to_pips(&self, distance: Decimal) -> Option<Decimal> {
        if self.pip_size.is_zero() {
            return None;
        }
        Some(distance / self.pip_size)
    }

    /// Monetary risk of one hundredth of a lot over `distance`.
    ///
    /// Returns `None` for a zero distance so callers never divide by zero.
    pub fn risk_per_lot(&self, distance: Decimal) -> Option<Decimal> {
        let pips = self.to_pips(distance.abs())?;
        let risk = pips * (self.pip_value / dec!(100));
        if risk.is_zero() {
            None
        } else {
            Some(risk)
        }
    }

    pub fn validate(&self) -> Result<(), TradingError> {
        if self.symbol.is_empty() {
            return Err(TradingError::Validation("Instrument symbol is empty".into()));
        }
        if self.pip_size <= Decimal::ZERO || self.pip_value <= Decimal::ZERO {
            return Err(TradingError::Validation(format!(
                "{}: pip size and pip value must be positive",
                self.symbol
            )));
        }
        if self.min_quantity <= Decimal::ZERO {
            return Err(TradingError::Validation(format!(
                "{}: minimum quantity must be positive",
                self.symbol
            )));
        }
        Ok(())
    }
}

/// Lookup table of instruments keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct InstrumentRegistry {
    instruments: BTreeMap<String, Instrument>,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: Instrument) {
        self.instruments
            .insert(instrument.symbol.clone(), instrument);
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }

    pub fn require(&self, symbol: &str) -> Result<&Instrument, TradingError> {
        self.get(symbol)
            .ok_or_else(|| TradingError::UnknownInstrument(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.instruments.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.instruments.keys()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl FromIterator<Instrument> for InstrumentRegistry {
    fn from_iter<T: IntoIterator<Item = Instrument>>(iter: T) -> Self {
        let mut registry = Self::new();
        for instrument in iter {
            registry.insert(instrument);
        }
        registry
    }
}
