//! Risk-management policies: trade gating and protective orders.

use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;
use rust_decimal::Decimal;
use trading_core::types::{Action, CycleBook, CycleContext, Order, OrderPatch, PendingOrder};

use crate::{CorrelationHedger, FixedStop};

/// Capability shared by every risk-management policy.
pub trait RiskManagement {
    fn name(&self) -> &str;

    /// Whether new orders may be built this cycle at all.
    fn trade_allowed(&self, ctx: &CycleContext<'_>) -> bool;

    /// Cancel stale stops in `book` and return the order paired with the
    /// entry: a protective stop on the same instrument, or a hedge on
    /// another one. May stage further companion orders in `book`.
    fn manage_stops(
        &mut self,
        ctx: &CycleContext<'_>,
        book: &mut CycleBook,
        order: &PendingOrder,
        action: Action,
    ) -> Option<Order>;

    /// Patch for a companion order returned by [`manage_stops`] once the
    /// entry it belongs to has been sized to `entry_size` (reversal
    /// excluded).
    ///
    /// [`manage_stops`]: RiskManagement::manage_stops
    fn resize_companion(
        &self,
        _ctx: &CycleContext<'_>,
        _companion: &PendingOrder,
        _entry_size: Decimal,
    ) -> Option<OrderPatch> {
        None
    }
}

/// Risk-management policy selected in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskPolicy {
    FixedStop(FixedStop),
    CorrelationHedge(CorrelationHedger),
}

impl Default for RiskPolicy {
    fn default() -> Self {
        RiskPolicy::FixedStop(FixedStop::default())
    }
}

impl RiskPolicy {
    pub fn validate(&self) -> Result<(), TradingError> {
        match self {
            RiskPolicy::FixedStop(policy) => policy.validate(),
            RiskPolicy::CorrelationHedge(policy) => policy.validate(),
        }
    }
}

impl RiskManagement for RiskPolicy {
    fn name(&self) -> &str {
        match self {
            RiskPolicy::FixedStop(_) => "fixed_stop",
            RiskPolicy::CorrelationHedge(_) => "correlation_hedge",
        }
    }

    fn trade_allowed(&self, ctx: &CycleContext<'_>) -> bool {
        match self {
            RiskPolicy::FixedStop(_) => true,
            RiskPolicy::CorrelationHedge(policy) => policy.trade_allowed(ctx),
        }
    }

    fn manage_stops(
        &mut self,
        ctx: &CycleContext<'_>,
        book: &mut CycleBook,
        order: &PendingOrder,
        action: Action,
    ) -> Option<Order> {
        match self {
            RiskPolicy::FixedStop(policy) => policy.manage_stops(ctx, book, order, action),
            RiskPolicy::CorrelationHedge(policy) => policy.manage_stops(ctx, book, order, action),
        }
    }

    fn resize_companion(
        &self,
        ctx: &CycleContext<'_>,
        companion: &PendingOrder,
        entry_size: Decimal,
    ) -> Option<OrderPatch> {
        match self {
            RiskPolicy::FixedStop(_) => None,
            RiskPolicy::CorrelationHedge(policy) => policy.resize_hedge(ctx, companion, entry_size),
        }
    }
}
