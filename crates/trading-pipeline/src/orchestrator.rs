//! Order construction for aggregated actions.

use serde::Serialize;
use tracing::{debug, info, warn};
use trading_broker::{BrokerProfile, CostModel};
use trading_core::types::{
    Action, CycleBook, CycleContext, DecisionSet, Direction, Order, OrderId, OrderRole,
    OrderTicket, PendingOrder,
};
use trading_risk::{PositionSizing, RiskManagement, RiskPolicy, SizingPolicy};

use crate::aggregate;

/// Everything one decision cycle asks the gateway to do.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleOutcome {
    /// Previously submitted orders to cancel
    pub cancellations: Vec<OrderId>,
    /// Orders to submit: entries, then stops, then companions
    pub tickets: Vec<OrderTicket>,
}

impl CycleOutcome {
    pub fn is_empty(&self) -> bool {
        self.cancellations.is_empty() && self.tickets.is_empty()
    }
}

/// Builds and updates orders from aggregated actions.
///
/// Holds the configured policies. The risk policy may keep state between
/// cycles (the selected hedge), so cycles must run one at a time.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    risk: RiskPolicy,
    sizing: SizingPolicy,
    costs: BrokerProfile,
}

impl Orchestrator {
    pub fn new(risk: RiskPolicy, sizing: SizingPolicy, costs: BrokerProfile) -> Self {
        Self { risk, sizing, costs }
    }

    pub fn risk(&self) -> &RiskPolicy {
        &self.risk
    }

    pub fn sizing(&self) -> &SizingPolicy {
        &self.sizing
    }

    pub fn costs(&self) -> &BrokerProfile {
        &self.costs
    }

    /// Run one decision cycle against an account snapshot.
    ///
    /// Nothing is built or canceled when the risk policy's pre-trade check
    /// fails.
    pub fn run_cycle(&mut self, ctx: &CycleContext<'_>, decisions: &DecisionSet) -> CycleOutcome {
        let actions = aggregate(decisions, ctx.account);
        if !self.risk.trade_allowed(ctx) {
            debug!(policy = self.risk.name(), "Pre-trade check failed, cycle skipped");
            return CycleOutcome::default();
        }

        let mut book = CycleBook::from_account(ctx.account);
        for (symbol, action) in &actions {
            self.build_order(ctx, &mut book, symbol, *action);
        }

        let (cancellations, orders) = book.finish();
        let tickets = orders
            .into_iter()
            .map(|order| {
                let costs = self.costs.costs(order.order());
                OrderTicket { order, costs }
            })
            .collect();
        CycleOutcome {
            cancellations,
            tickets,
        }
    }

    /// Build (or rebuild) the order for one instrument and stage it in
    /// `book`. Returns false when the action produces no order.
    pub fn build_order(
        &mut self,
        ctx: &CycleContext<'_>,
        book: &mut CycleBook,
        symbol: &str,
        action: Action,
    ) -> bool {
        let Some(instrument) = ctx.instrument(symbol) else {
            warn!(symbol, "Unknown instrument, no order built");
            return false;
        };

        let order = match action {
            Action::OpenLong | Action::OpenShort => {
                Order::market(symbol, action.direction(), instrument.min_quantity)
            }
            Action::Flatten => {
                let Some(position) = ctx.position(symbol) else {
                    debug!(symbol, "Nothing to flatten");
                    return false;
                };
                Order::market(symbol, Direction::Flat, position.abs_quantity())
                    .with_role(OrderRole::Exit)
            }
        };
        let mut entry = PendingOrder::new(order);

        let mut stop = None;
        let mut companion = None;
        if let Some(paired) = self.risk.manage_stops(ctx, book, &entry, action) {
            if paired.role == OrderRole::ProtectiveStop && paired.symbol == symbol {
                stop = Some(PendingOrder::new(paired));
            } else {
                companion = Some(PendingOrder::new(paired));
            }
        }

        // Without a fresh stop, sizing falls back to the one already working
        let mut live_stop = None;
        if stop.is_none() && action.is_entry() {
            if let Some(existing) = book.stop_for(symbol) {
                let existing = existing.clone();
                if book.live().any(|o| o.id == existing.id) {
                    live_stop = Some(existing);
                } else {
                    stop = Some(existing);
                }
            }
        }

        let sizing = self
            .sizing
            .size(ctx, &entry, stop.as_ref().or(live_stop.as_ref()), action);
        let mut reissue = None;
        if let Some(sizing) = sizing {
            if let Some(companion) = companion.as_mut() {
                if let Some(patch) = self.risk.resize_companion(ctx, companion, sizing.size) {
                    companion.apply(patch);
                }
            }
            entry.apply(sizing.entry);
            if let Some(patch) = sizing.stop {
                if let Some(stop) = stop.as_mut() {
                    stop.apply(patch);
                } else if let Some(live) = &live_stop {
                    let mut copy = live.reissue();
                    copy.apply(patch);
                    reissue = Some((live.id, copy));
                }
            }
        }

        info!(
            symbol,
            %action,
            direction = %entry.order().direction,
            quantity = %entry.quantity(),
            stop = ?stop.as_ref().and_then(|s| s.order().stop_price),
            "Order built"
        );
        book.stage(entry, stop);
        if let Some(companion) = companion {
            book.stage_companion(companion);
        }
        if let Some((original, copy)) = reissue {
            book.reissue_stop(original, copy);
        }
        true
    }
}
