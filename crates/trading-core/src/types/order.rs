//! Orders, pending orders and the patches later stages apply to them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    /// Close whatever position exists.
    Flat,
}

impl Direction {
    /// Get the opposite direction. Flat has no opposite.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
            Direction::Flat => Direction::Flat,
        }
    }

    /// Sign used for position arithmetic (+1 long, -1 short, 0 flat).
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => -Decimal::ONE,
            Direction::Flat => Decimal::ZERO,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::Flat => write!(f, "FLAT"),
        }
    }
}

/// Order kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderKind {
    /// Stop and stop-limit orders are swept by the protective-stop policy.
    pub fn is_stop(&self) -> bool {
        matches!(self, OrderKind::Stop | OrderKind::StopLimit)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "MARKET"),
            OrderKind::Limit => write!(f, "LIMIT"),
            OrderKind::Stop => write!(f, "STOP"),
            OrderKind::StopLimit => write!(f, "STOP_LIMIT"),
        }
    }
}

/// Why an order exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderRole {
    /// Opens (or reverses into) a position from an aggregated action
    #[default]
    Entry,
    /// Closes a position from an aggregated flatten action
    Exit,
    /// Protective stop paired with an entry
    ProtectiveStop,
    /// Opposing order on a correlated instrument
    Hedge,
    /// Closes a previously selected hedge
    HedgeExit,
}

/// Immutable order intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub direction: Direction,
    pub kind: OrderKind,
    pub quantity: Decimal,
    /// Trigger price (stop and stop-limit orders)
    pub stop_price: Option<Decimal>,
    /// Limit price (limit and stop-limit orders)
    pub limit_price: Option<Decimal>,
    pub role: OrderRole,
}

impl Order {
    /// Create a market order.
    pub fn market(symbol: impl Into<String>, direction: Direction, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            kind: OrderKind::Market,
            quantity,
            stop_price: None,
            limit_price: None,
            role: OrderRole::Entry,
        }
    }

    /// Create a limit order.
    pub fn limit(
        symbol: impl Into<String>,
        direction: Direction,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            kind: OrderKind::Limit,
            limit_price: Some(limit_price),
            ..Self::market(symbol, direction, quantity)
        }
    }

    /// Create a stop order.
    pub fn stop(
        symbol: impl Into<String>,
        direction: Direction,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            kind: OrderKind::Stop,
            stop_price: Some(stop_price),
            role: OrderRole::ProtectiveStop,
            ..Self::market(symbol, direction, quantity)
        }
    }

    /// Create a stop-limit order.
    pub fn stop_limit(
        symbol: impl Into<String>,
        direction: Direction,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            kind: OrderKind::StopLimit,
            stop_price: Some(stop_price),
            limit_price: Some(limit_price),
            role: OrderRole::ProtectiveStop,
            ..Self::market(symbol, direction, quantity)
        }
    }

    pub fn with_role(mut self, role: OrderRole) -> Self {
        self.role = role;
        self
    }

    /// The price the order is anchored to, if any.
    pub fn price(&self) -> Option<Decimal> {
        self.stop_price.or(self.limit_price)
    }

    pub fn is_stop(&self) -> bool {
        self.kind.is_stop()
    }
}

/// Unique id of a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Pipeline stage that produced a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStage {
    RiskManagement,
    PositionSizing,
}

/// A change to the mutable fields of a pending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub stage: PatchStage,
    /// Name of the policy that produced the patch
    pub policy: String,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
}

impl OrderPatch {
    pub fn quantity(stage: PatchStage, policy: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            stage,
            policy: policy.into(),
            quantity: Some(quantity),
            price: None,
        }
    }

    pub fn price(stage: PatchStage, policy: impl Into<String>, price: Decimal) -> Self {
        Self {
            stage,
            policy: policy.into(),
            quantity: None,
            price: Some(price),
        }
    }
}

/// A live, broker-unconfirmed order.
///
/// Quantity and price may be patched until the order is handed to the
/// gateway; every applied patch is kept for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: OrderId,
    order: Order,
    patches: Vec<OrderPatch>,
    pub created_at: DateTime<Utc>,
}

impl PendingOrder {
    pub fn new(order: Order) -> Self {
        Self {
            id: OrderId::new(),
            order,
            patches: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn symbol(&self) -> &str {
        &self.order.symbol
    }

    pub fn quantity(&self) -> Decimal {
        self.order.quantity
    }

    pub fn is_stop(&self) -> bool {
        self.order.is_stop()
    }

    /// Copy this order under a fresh id, keeping its audit trail.
    ///
    /// Used when a submitted order must be changed: the old id is canceled
    /// and the copy is submitted in its place.
    pub fn reissue(&self) -> Self {
        Self {
            id: OrderId::new(),
            order: self.order.clone(),
            patches: self.patches.clone(),
            created_at: Utc::now(),
        }
    }

    /// Patches applied so far, oldest first.
    pub fn patches(&self) -> &[OrderPatch] {
        &self.patches
    }

    /// Apply a patch. Fields are last-write-wins.
    ///
    /// A price patch moves the stop price of stop orders and the limit price
    /// of limit orders; market orders carry no price and keep none.
    pub fn apply(&mut self, patch: OrderPatch) {
        if let Some(quantity) = patch.quantity {
            self.order.quantity = quantity;
        }
        if let Some(price) = patch.price {
            match self.order.kind {
                OrderKind::Stop | OrderKind::StopLimit => self.order.stop_price = Some(price),
                OrderKind::Limit => self.order.limit_price = Some(price),
                OrderKind::Market => {}
            }
        }
        self.patches.push(patch);
    }
}

/// Costs the broker model attaches to an order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderCosts {
    /// Commission in account currency
    pub commission: Decimal,
    /// Spread in pips
    pub spread: Decimal,
    /// Expected slippage in pips
    pub slippage: Decimal,
    pub latency_ms: u64,
}

/// A finalized order ready for the execution gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub order: PendingOrder,
    pub costs: OrderCosts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_order() {
        let order = Order::market("EURUSD", Direction::Long, dec!(0.01));
        assert_eq!(order.kind, OrderKind::Market);
        assert_eq!(order.role, OrderRole::Entry);
        assert!(order.price().is_none());
        assert!(!order.is_stop());
    }

    #[test]
    fn test_stop_order() {
        let order = Order::stop("EURUSD", Direction::Short, dec!(0.01), dec!(1.1030));
        assert!(order.is_stop());
        assert_eq!(order.role, OrderRole::ProtectiveStop);
        assert_eq!(order.price(), Some(dec!(1.1030)));
    }

    #[test]
    fn test_patches_are_last_write_wins() {
        let mut pending =
            PendingOrder::new(Order::stop("EURUSD", Direction::Short, dec!(0.01), dec!(1.1030)));

        pending.apply(OrderPatch::quantity(PatchStage::PositionSizing, "a", dec!(0.30)));
        pending.apply(OrderPatch::quantity(PatchStage::PositionSizing, "b", dec!(0.50)));
        pending.apply(OrderPatch::price(PatchStage::RiskManagement, "c", dec!(1.1025)));

        assert_eq!(pending.quantity(), dec!(0.50));
        assert_eq!(pending.order().stop_price, Some(dec!(1.1025)));
        assert_eq!(pending.patches().len(), 3);
        assert_eq!(pending.patches()[1].policy, "b");
    }

    #[test]
    fn test_reissue_keeps_audit_trail() {
        let mut pending = PendingOrder::new(Order::market("EURUSD", Direction::Long, dec!(0.01)));
        pending.apply(OrderPatch::quantity(PatchStage::PositionSizing, "fixed_units", dec!(0.05)));

        let copy = pending.reissue();
        assert_ne!(copy.id, pending.id);
        assert_eq!(copy.order(), pending.order());
        assert_eq!(copy.patches().len(), 1);
    }

    #[test]
    fn test_price_patch_ignored_on_market_orders() {
        let mut pending = PendingOrder::new(Order::market("EURUSD", Direction::Long, dec!(0.01)));
        pending.apply(OrderPatch::price(PatchStage::RiskManagement, "x", dec!(1.2)));
        assert!(pending.order().price().is_none());
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::Short.opposite(), Direction::Long);
        assert_eq!(Direction::Flat.opposite(), Direction::Flat);
    }
}
