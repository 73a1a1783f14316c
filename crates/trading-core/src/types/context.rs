//! Read-only inputs of one decision cycle.

use super::{Account, Instrument, InstrumentRegistry, Position};
use crate::traits::MarketView;

/// Everything a policy may read during a cycle.
#[derive(Clone, Copy)]
pub struct CycleContext<'a> {
    pub account: &'a Account,
    pub market: &'a dyn MarketView,
    pub instruments: &'a InstrumentRegistry,
}

impl<'a> CycleContext<'a> {
    pub fn new(
        account: &'a Account,
        market: &'a dyn MarketView,
        instruments: &'a InstrumentRegistry,
    ) -> Self {
        Self {
            account,
            market,
            instruments,
        }
    }

    pub fn instrument(&self, symbol: &str) -> Option<&'a Instrument> {
        self.instruments.get(symbol)
    }

    /// Non-flat position in an instrument.
    pub fn position(&self, symbol: &str) -> Option<&'a Position> {
        self.account.position(symbol)
    }
}
