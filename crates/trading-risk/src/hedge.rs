//! Correlation hedger.
//!
//! Each entry is paired with an opposing order on the basket member whose
//! recent closes track the primary instrument most closely. The correlation
//! table is rebuilt for every decision; only the selected hedge symbol is
//! remembered between cycles.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trading_core::error::TradingError;
use trading_core::types::{
    Action, CycleBook, CycleContext, Direction, Order, OrderPatch, OrderRole, PatchStage,
    PendingOrder, LOT_STEP,
};

use crate::correlation::{CorrelationTable, DEFAULT_WINDOW};

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_hedge_fraction() -> Decimal {
    dec!(0.5)
}

fn default_roi_floor() -> Decimal {
    dec!(-20)
}

/// Correlation hedge policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationHedger {
    /// Instrument whose closes the basket is correlated against
    pub primary: String,
    /// Candidate hedge instruments, in tie-break order
    pub basket: Vec<String>,
    #[serde(default = "default_window")]
    pub window: usize,
    /// Hedge quantity as a fraction of the entry quantity
    #[serde(default = "default_hedge_fraction")]
    pub hedge_fraction: Decimal,
    /// Trading stops once realized return falls below this percentage
    #[serde(default = "default_roi_floor")]
    pub roi_floor_pct: Decimal,
    #[serde(skip)]
    current_hedge: Option<String>,
}

impl CorrelationHedger {
    pub fn new(primary: impl Into<String>, basket: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            basket,
            window: DEFAULT_WINDOW,
            hedge_fraction: default_hedge_fraction(),
            roi_floor_pct: default_roi_floor(),
            current_hedge: None,
        }
    }

    pub fn with_hedge_fraction(mut self, fraction: Decimal) -> Self {
        self.hedge_fraction = fraction;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Instrument selected as hedge by the last entry, if any.
    pub fn current_hedge(&self) -> Option<&str> {
        self.current_hedge.as_deref()
    }

    pub fn validate(&self) -> Result<(), TradingError> {
        let reason = if self.primary.is_empty() {
            "Hedge primary instrument is empty"
        } else if self.basket.is_empty() {
            "Hedge basket is empty"
        } else if self.window < 2 {
            "Correlation window must be at least 2"
        } else if self.hedge_fraction <= Decimal::ZERO {
            "Hedge fraction must be positive"
        } else {
            return Ok(());
        };
        Err(TradingError::Validation(reason.into()))
    }

    pub(crate) fn trade_allowed(&self, ctx: &CycleContext<'_>) -> bool {
        let roi = ctx.account.realized_return_pct();
        if roi < self.roi_floor_pct {
            info!(
                %roi,
                floor = %self.roi_floor_pct,
                "Realized return below floor, trading disabled"
            );
            return false;
        }
        if ctx.market.trailing_closes(&self.primary, self.window).is_none() {
            debug!(primary = %self.primary, window = self.window, "Correlation window not full");
            return false;
        }
        true
    }

    pub(crate) fn manage_stops(
        &mut self,
        ctx: &CycleContext<'_>,
        book: &mut CycleBook,
        order: &PendingOrder,
        action: Action,
    ) -> Option<Order> {
        let symbol = order.symbol();

        if !action.is_entry() {
            if let Some(hedge) = self.current_hedge.take() {
                if hedge != symbol {
                    Self::unwind(ctx, book, &hedge);
                }
            }
            return None;
        }

        let table =
            CorrelationTable::compute(ctx.market, &self.primary, &self.basket, self.window)?;
        let Some((selected, r)) = table.most_correlated(symbol) else {
            debug!(symbol, "No hedge candidate with a full correlation window");
            return None;
        };
        let selected = selected.to_string();

        if let Some(previous) = self.current_hedge.replace(selected.clone()) {
            // The entry's own reversal closes a former hedge being traded
            if previous != selected && previous != symbol {
                info!(from = %previous, to = %selected, "Hedge instrument changed");
                Self::unwind(ctx, book, &previous);
            }
        }

        let direction = action.direction().opposite();
        let quantity = self.hedge_quantity(ctx, &selected, direction, order.quantity());

        debug!(symbol, hedge = %selected, correlation = r, %quantity, "Hedging entry");
        Some(Order::market(selected, direction, quantity).with_role(OrderRole::Hedge))
    }

    /// Re-size a staged hedge once its entry has been sized.
    pub(crate) fn resize_hedge(
        &self,
        ctx: &CycleContext<'_>,
        hedge: &PendingOrder,
        entry_size: Decimal,
    ) -> Option<OrderPatch> {
        if hedge.order().role != OrderRole::Hedge {
            return None;
        }
        let order = hedge.order();
        let quantity = self.hedge_quantity(ctx, &order.symbol, order.direction, entry_size);
        Some(OrderPatch::quantity(
            PatchStage::RiskManagement,
            "correlation_hedge",
            quantity,
        ))
    }

    /// `hedge_fraction` of the entry size in whole hundredths, at least one
    /// hundredth, plus any opposite position held in the hedge instrument.
    fn hedge_quantity(
        &self,
        ctx: &CycleContext<'_>,
        hedge: &str,
        direction: Direction,
        entry_size: Decimal,
    ) -> Decimal {
        let base = (self.hedge_fraction * entry_size / LOT_STEP).floor() * LOT_STEP;
        let reversal = ctx
            .position(hedge)
            .map(|p| p.reversal_quantity(direction))
            .unwrap_or_default();
        base.max(LOT_STEP) + reversal
    }

    /// Close whatever position is held in a former hedge instrument.
    fn unwind(ctx: &CycleContext<'_>, book: &mut CycleBook, symbol: &str) {
        if let Some(position) = ctx.position(symbol) {
            book.stage_companion(PendingOrder::new(
                Order::market(symbol, Direction::Flat, position.abs_quantity())
                    .with_role(OrderRole::HedgeExit),
            ));
        }
    }
}
