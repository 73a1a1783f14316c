//! Paper execution gateway for backtesting and simulation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use trading_core::error::BrokerError;
use trading_core::traits::ExecutionGateway;
use trading_core::types::{
    to_price, Account, Bar, Direction, Instrument, InstrumentRegistry, Order, OrderId,
    OrderKind, OrderRole, PendingOrder, Position,
};

use crate::cost::{BrokerProfile, CostModel};

/// An executed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: String,
    /// Side actually traded (flat orders resolve to the closing side)
    pub direction: Direction,
    pub role: OrderRole,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub realized_pnl: Decimal,
    /// Bar timestamp in milliseconds
    pub timestamp: i64,
}

enum Execution {
    Filled(Fill),
    Resting,
    Dropped(&'static str),
}

/// Paper gateway holding an in-memory account.
///
/// Orders submitted during a bar are executed against the next bar of
/// their instrument: market orders at its open, stops and limits when its
/// range reaches them. Spread and slippage from the broker profile move
/// fills against the trader; commission is debited from cash.
pub struct PaperBroker {
    account: Mutex<Account>,
    instruments: InstrumentRegistry,
    costs: BrokerProfile,
}

impl PaperBroker {
    pub fn new(
        initial_capital: Decimal,
        instruments: InstrumentRegistry,
        costs: BrokerProfile,
    ) -> Self {
        Self {
            account: Mutex::new(Account::new(initial_capital)),
            instruments,
            costs,
        }
    }

    /// Execute resting orders of `symbol` against a new bar, then mark its
    /// position to the close.
    pub async fn on_bar(&self, symbol: &str, bar: &Bar) -> Vec<Fill> {
        let Some(instrument) = self.instruments.get(symbol) else {
            return Vec::new();
        };
        let mut account = self.account.lock().await;

        let (mine, mut remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut account.pending_orders)
            .into_iter()
            .partition(|o| o.symbol() == symbol);
        // Market orders execute at the open, ahead of anything resting
        let (market, resting): (Vec<_>, Vec<_>) = mine
            .into_iter()
            .partition(|o| o.order().kind == OrderKind::Market);

        let mut fills = Vec::new();
        for order in market.into_iter().chain(resting) {
            match self.execute(&mut account, instrument, &order, bar) {
                Execution::Filled(fill) => {
                    info!(
                        symbol,
                        direction = %fill.direction,
                        quantity = %fill.quantity,
                        price = %fill.price,
                        role = ?fill.role,
                        "Order filled"
                    );
                    fills.push(fill);
                }
                Execution::Resting => remaining.push(order),
                Execution::Dropped(reason) => {
                    debug!(symbol, id = %order.id, reason, "Order dropped")
                }
            }
        }
        account.pending_orders = remaining;

        if let Some(position) = account.positions.get_mut(symbol) {
            position.update_price(to_price(bar.close));
        }
        account.update_equity();
        fills
    }

    /// Current account snapshot.
    pub async fn snapshot(&self) -> Account {
        self.account.lock().await.clone()
    }

    fn execute(
        &self,
        account: &mut Account,
        instrument: &Instrument,
        pending: &PendingOrder,
        bar: &Bar,
    ) -> Execution {
        let order = pending.order();
        let symbol = order.symbol.as_str();
        let held = account
            .position(symbol)
            .map(|p| p.quantity)
            .unwrap_or_default();

        let (direction, mut quantity) = match order.direction {
            Direction::Flat if held.is_zero() => return Execution::Dropped("nothing to flatten"),
            Direction::Flat if held > Decimal::ZERO => (Direction::Short, held.abs()),
            Direction::Flat => (Direction::Long, held.abs()),
            d => (d, order.quantity),
        };

        // Protective stops only ever reduce the position they protect
        if order.role == OrderRole::ProtectiveStop {
            let reducible = if held * direction.sign() < Decimal::ZERO {
                held.abs()
            } else {
                Decimal::ZERO
            };
            if reducible.is_zero() {
                return Execution::Dropped("no position to protect");
            }
            quantity = quantity.min(reducible);
        }

        let Some(price) = self.fill_price(instrument, pending, direction, bar) else {
            return match (order.kind, order.price()) {
                (OrderKind::Market, _) | (_, Some(_)) => Execution::Resting,
                (_, None) => Execution::Dropped("missing trigger price"),
            };
        };

        let executed = Order {
            direction,
            quantity,
            ..order.clone()
        };
        let commission = self.costs.commission(&executed);
        let multiplier = instrument.contract_size();
        let position = account
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| {
                Position::new(symbol, Decimal::ZERO, price).with_multiplier(multiplier)
            });
        let realized = position.apply_fill(direction, quantity, price);
        if position.is_flat() {
            account.positions.remove(symbol);
        }

        account.cash += realized - commission;
        account.total_realized_pnl += realized;
        account.total_commission += commission;

        Execution::Filled(Fill {
            order_id: pending.id,
            symbol: symbol.to_string(),
            direction,
            role: order.role,
            quantity,
            price,
            commission,
            realized_pnl: realized,
            timestamp: bar.timestamp,
        })
    }

    /// Price an order would fill at on this bar, `None` if it does not.
    fn fill_price(
        &self,
        instrument: &Instrument,
        pending: &PendingOrder,
        direction: Direction,
        bar: &Bar,
    ) -> Option<Decimal> {
        let order = pending.order();
        let (open, high, low) = (to_price(bar.open), to_price(bar.high), to_price(bar.low));
        let long = direction == Direction::Long;
        let half_spread = self.costs.spread(order) / Decimal::TWO * instrument.pip_size;
        let slippage = self.costs.slippage(order) * instrument.pip_size;
        let adverse = direction.sign() * (half_spread + slippage);

        match order.kind {
            OrderKind::Market => Some(open + adverse),
            OrderKind::Stop => {
                let stop = order.stop_price?;
                let base = triggered(long, stop, open, high, low)?;
                Some(base + adverse)
            }
            OrderKind::Limit => {
                let limit = order.limit_price?;
                if long && low <= limit {
                    Some(open.min(limit))
                } else if !long && high >= limit {
                    Some(open.max(limit))
                } else {
                    None
                }
            }
            OrderKind::StopLimit => {
                let base = triggered(long, order.stop_price?, open, high, low)?;
                let limit = order.limit_price?;
                let within = if long { base <= limit } else { base >= limit };
                within.then_some(base)
            }
        }
    }
}

/// Trigger price of a stop on this bar; gaps through the stop fill at the open.
fn triggered(
    long: bool,
    stop: Decimal,
    open: Decimal,
    high: Decimal,
    low: Decimal,
) -> Option<Decimal> {
    if long && high >= stop {
        Some(open.max(stop))
    } else if !long && low <= stop {
        Some(open.min(stop))
    } else {
        None
    }
}

#[async_trait]
impl ExecutionGateway for PaperBroker {
    async fn account(&self) -> Result<Account, BrokerError> {
        Ok(self.account.lock().await.clone())
    }

    async fn submit_order(&self, order: PendingOrder) -> Result<OrderId, BrokerError> {
        if !self.instruments.contains(order.symbol()) {
            return Err(BrokerError::UnknownInstrument(order.symbol().to_string()));
        }
        if order.quantity() < Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "Negative quantity {} for {}",
                order.quantity(),
                order.symbol()
            )));
        }
        let id = order.id;
        self.account.lock().await.pending_orders.push(order);
        Ok(id)
    }

    async fn cancel_order(&self, id: OrderId) -> Result<(), BrokerError> {
        let mut account = self.account.lock().await;
        let index = account
            .pending_orders
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| BrokerError::OrderNotFound(id.to_string()))?;
        account.pending_orders.remove(index);
        Ok(())
    }

    fn name(&self) -> &str {
        "paper"
    }
}
