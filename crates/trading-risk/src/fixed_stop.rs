//! Protective stop at a fixed pip distance from the close.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::error::TradingError;
use trading_core::types::{
    Action, CycleBook, CycleContext, Direction, Order, PendingOrder, SweepScope,
};

/// Which live stops are canceled before a new stop is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopSweep {
    /// Every live stop of every instrument
    #[default]
    AllInstruments,
    /// Live stops of the instrument being traded
    TradedInstrument,
}

/// Fixed-distance stop policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedStop {
    pub distance_pips: Decimal,
    #[serde(default)]
    pub sweep: StopSweep,
}

impl Default for FixedStop {
    fn default() -> Self {
        Self {
            distance_pips: dec!(20),
            sweep: StopSweep::AllInstruments,
        }
    }
}

impl FixedStop {
    pub fn new(distance_pips: Decimal) -> Self {
        Self {
            distance_pips,
            ..Default::default()
        }
    }

    pub fn with_sweep(mut self, sweep: StopSweep) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn validate(&self) -> Result<(), TradingError> {
        if self.distance_pips <= Decimal::ZERO {
            return Err(TradingError::Validation("Stop distance must be positive".into()));
        }
        Ok(())
    }

    /// Cancel stale stops, then return a new opposing stop for entries.
    pub(crate) fn manage_stops(
        &self,
        ctx: &CycleContext<'_>,
        book: &mut CycleBook,
        order: &PendingOrder,
        action: Action,
    ) -> Option<Order> {
        let symbol = order.symbol();
        let scope = match self.sweep {
            StopSweep::AllInstruments => SweepScope::All,
            StopSweep::TradedInstrument => SweepScope::Instrument(symbol),
        };
        let canceled = book.cancel_stops(scope);
        if canceled > 0 {
            debug!(symbol, canceled, sweep = ?self.sweep, "Canceled live stops");
        }

        if !action.is_entry() {
            return None;
        }
        let instrument = ctx.instrument(symbol)?;
        let close = ctx.market.last_close(symbol)?;
        let distance = self.distance_pips * instrument.pip_size;
        let direction = action.direction();
        let stop_price = match direction {
            Direction::Long => close - distance,
            _ => close + distance,
        };

        debug!(symbol, %close, %stop_price, "Placing protective stop");
        Some(Order::stop(
            symbol,
            direction.opposite(),
            order.quantity(),
            stop_price,
        ))
    }
}
