//! Position and account types.

use num_traits::Signed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Direction, PendingOrder};

/// A position in a single instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Lots held (positive for long, negative for short)
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
    pub current_price: Decimal,
    /// Currency value of a one-unit price move on one lot
    pub multiplier: Decimal,
    pub unrealized_pnl: Decimal,
    /// Realized profit/loss from closed portions
    pub realized_pnl: Decimal,
}

impl Position {
    /// Create a new position.
    pub fn new(symbol: impl Into<String>, quantity: Decimal, avg_entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_entry_price,
            current_price: avg_entry_price,
            multiplier: Decimal::ONE,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
        }
    }

    pub fn with_multiplier(mut self, multiplier: Decimal) -> Self {
        self.multiplier = multiplier;
        self.update_price(self.current_price);
        self
    }

    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }

    pub fn abs_quantity(&self) -> Decimal {
        self.quantity.abs()
    }

    /// Direction of the holding, `Flat` when nothing is held.
    pub fn direction(&self) -> Direction {
        if self.is_long() {
            Direction::Long
        } else if self.is_short() {
            Direction::Short
        } else {
            Direction::Flat
        }
    }

    /// Quantity that must be added to an order in `direction` so that it
    /// also closes this position. Zero unless the position is opposite.
    pub fn reversal_quantity(&self, direction: Direction) -> Decimal {
        match direction {
            Direction::Long if self.is_short() => self.abs_quantity(),
            Direction::Short if self.is_long() => self.abs_quantity(),
            _ => Decimal::ZERO,
        }
    }

    /// Update the current market price and recalculate unrealized P&L.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.unrealized_pnl = (price - self.avg_entry_price) * self.quantity * self.multiplier;
    }

    /// Apply a fill to the position.
    /// Returns the realized P&L if the position is being reduced.
    pub fn apply_fill(
        &mut self,
        direction: Direction,
        quantity: Decimal,
        price: Decimal,
    ) -> Decimal {
        let fill_qty = direction.sign() * quantity;
        if fill_qty.is_zero() {
            return Decimal::ZERO;
        }

        let mut realized = Decimal::ZERO;
        let same_direction = self.quantity.signum() == fill_qty.signum();

        if same_direction || self.is_flat() {
            // Adding to position - update average entry price
            let total_cost = self.quantity * self.avg_entry_price + fill_qty * price;
            let new_quantity = self.quantity + fill_qty;
            if !new_quantity.is_zero() {
                self.avg_entry_price = total_cost / new_quantity;
            }
            self.quantity = new_quantity;
        } else {
            // Reducing or reversing position
            let close_qty = fill_qty.abs().min(self.quantity.abs());
            realized = if self.is_long() {
                close_qty * (price - self.avg_entry_price)
            } else {
                close_qty * (self.avg_entry_price - price)
            } * self.multiplier;
            self.realized_pnl += realized;

            let remaining = fill_qty.abs() - close_qty;
            if remaining > Decimal::ZERO {
                // Position reversed
                self.quantity = fill_qty.signum() * remaining;
                self.avg_entry_price = price;
            } else {
                self.quantity += fill_qty;
            }
        }

        self.update_price(price);
        realized
    }
}

/// Account snapshot: equity, positions and the pending-order book.
///
/// The pipeline only ever reads it; it changes through fills reported by
/// the execution gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    /// Cash balance (realized results and commissions settle here)
    pub cash: Decimal,
    /// Cash plus unrealized results
    pub equity: Decimal,
    pub positions: HashMap<String, Position>,
    /// Orders accepted by the gateway but not yet filled
    pub pending_orders: Vec<PendingOrder>,
    pub total_unrealized_pnl: Decimal,
    pub total_realized_pnl: Decimal,
    pub total_commission: Decimal,
    /// Initial capital (for calculating returns)
    pub initial_capital: Decimal,
    /// Highest equity reached (for drawdown calculation)
    pub peak_equity: Decimal,
}

impl Account {
    /// Create a new account with initial cash.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            equity: initial_capital,
            initial_capital,
            peak_equity: initial_capital,
            ..Default::default()
        }
    }

    /// Get a non-flat position by symbol.
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol).filter(|p| !p.is_flat())
    }

    /// Pending orders for one symbol.
    pub fn pending_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a PendingOrder> {
        self.pending_orders.iter().filter(move |o| o.symbol() == symbol)
    }

    /// Recalculate equity from cash and open positions.
    pub fn update_equity(&mut self) {
        self.total_unrealized_pnl = self.positions.values().map(|p| p.unrealized_pnl).sum();
        self.equity = self.cash + self.total_unrealized_pnl;
        if self.equity > self.peak_equity {
            self.peak_equity = self.equity;
        }
    }

    /// Realized return on investment, as a percentage of initial capital.
    pub fn realized_return_pct(&self) -> Decimal {
        if self.initial_capital.is_zero() {
            return Decimal::ZERO;
        }
        self.total_realized_pnl / self.initial_capital * Decimal::from(100)
    }

    /// Calculate current drawdown from peak, in percent.
    pub fn drawdown(&self) -> Decimal {
        if self.peak_equity.is_zero() {
            return Decimal::ZERO;
        }
        (self.peak_equity - self.equity) / self.peak_equity * Decimal::from(100)
    }

    /// Calculate total return percentage.
    pub fn total_return(&self) -> Decimal {
        if self.initial_capital.is_zero() {
            return Decimal::ZERO;
        }
        (self.equity - self.initial_capital) / self.initial_capital * Decimal::from(100)
    }

    pub fn position_count(&self) -> usize {
        self.positions.values().filter(|p| !p.is_flat()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Order;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_long() {
        let mut position =
            Position::new("EURUSD", dec!(1), dec!(1.1000)).with_multiplier(dec!(100000));
        assert!(position.is_long());
        assert_eq!(position.direction(), Direction::Long);

        position.update_price(dec!(1.1010));
        assert_eq!(position.unrealized_pnl, dec!(100));
    }

    #[test]
    fn test_apply_fill_increase() {
        let mut position = Position::new("EURUSD", dec!(1), dec!(1.1000));

        let realized = position.apply_fill(Direction::Long, dec!(1), dec!(1.1020));
        assert_eq!(realized, Decimal::ZERO);
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.avg_entry_price, dec!(1.1010));
    }

    #[test]
    fn test_apply_fill_reversal() {
        let mut position =
            Position::new("EURUSD", dec!(0.5), dec!(1.1000)).with_multiplier(dec!(100000));

        // Sell 0.8: closes 0.5 at +20 pips, opens 0.3 short
        let realized = position.apply_fill(Direction::Short, dec!(0.8), dec!(1.1020));
        assert_eq!(realized, dec!(100));
        assert_eq!(position.quantity, dec!(-0.3));
        assert_eq!(position.avg_entry_price, dec!(1.1020));
    }

    #[test]
    fn test_reversal_quantity() {
        let short = Position::new("EURUSD", dec!(-0.4), dec!(1.1));
        assert_eq!(short.reversal_quantity(Direction::Long), dec!(0.4));
        assert_eq!(short.reversal_quantity(Direction::Short), Decimal::ZERO);
        assert_eq!(short.reversal_quantity(Direction::Flat), Decimal::ZERO);
    }

    #[test]
    fn test_account_position_filters_flat() {
        let mut account = Account::new(dec!(10000));
        account
            .positions
            .insert("EURUSD".into(), Position::new("EURUSD", Decimal::ZERO, dec!(1.1)));
        assert!(account.position("EURUSD").is_none());
        assert_eq!(account.position_count(), 0);
    }

    #[test]
    fn test_pending_for_symbol() {
        let mut account = Account::new(dec!(10000));
        account
            .pending_orders
            .push(PendingOrder::new(Order::stop(
                "EURUSD",
                Direction::Short,
                dec!(0.1),
                dec!(1.09),
            )));
        account
            .pending_orders
            .push(PendingOrder::new(Order::stop("GBPUSD", Direction::Long, dec!(0.1), dec!(1.31))));
        assert_eq!(account.pending_for("EURUSD").count(), 1);
    }

    #[test]
    fn test_realized_return() {
        let mut account = Account::new(dec!(10000));
        account.total_realized_pnl = dec!(-2500);
        assert_eq!(account.realized_return_pct(), dec!(-25));
    }

    #[test]
    fn test_drawdown() {
        let mut account = Account::new(dec!(10000));
        account.peak_equity = dec!(11000);
        account.equity = dec!(9900);
        assert_eq!(account.drawdown(), dec!(10));
    }
}
