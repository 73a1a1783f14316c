//! Cycle-scoped working copy of the pending-order book.

use std::collections::BTreeMap;

use super::{Account, OrderId, OrderRole, PendingOrder};

/// Which live stops a sweep cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepScope<'a> {
    /// Every live stop, whatever the instrument
    All,
    /// Live stops of one instrument only
    Instrument(&'a str),
}

/// Orders touched during one decision cycle.
///
/// Live orders come from the account snapshot and are never mutated here:
/// they can only be canceled, or canceled and reissued with new values.
/// Everything staged is keyed so that building the same instrument twice in
/// one cycle leaves only the last version.
#[derive(Debug, Clone, Default)]
pub struct CycleBook {
    live: Vec<PendingOrder>,
    cancellations: Vec<OrderId>,
    entries: BTreeMap<String, PendingOrder>,
    stops: BTreeMap<String, PendingOrder>,
    companions: Vec<PendingOrder>,
}

impl CycleBook {
    /// Start a cycle from the account's pending-order book.
    pub fn from_account(account: &Account) -> Self {
        Self {
            live: account.pending_orders.clone(),
            ..Default::default()
        }
    }

    pub fn is_canceled(&self, id: OrderId) -> bool {
        self.cancellations.contains(&id)
    }

    /// Live orders not canceled this cycle.
    pub fn live(&self) -> impl Iterator<Item = &PendingOrder> {
        self.live.iter().filter(move |o| !self.is_canceled(o.id))
    }

    /// Cancel a live order. Returns false if it is unknown or already canceled.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        if self.is_canceled(id) || !self.live.iter().any(|o| o.id == id) {
            return false;
        }
        self.cancellations.push(id);
        true
    }

    /// Cancel live stop and stop-limit orders in scope. Returns how many were
    /// canceled by this call.
    ///
    /// Stops staged during this cycle are not touched.
    pub fn cancel_stops(&mut self, scope: SweepScope<'_>) -> usize {
        let ids: Vec<OrderId> = self
            .live()
            .filter(|o| o.is_stop())
            .filter(|o| match scope {
                SweepScope::All => true,
                SweepScope::Instrument(symbol) => o.symbol() == symbol,
            })
            .map(|o| o.id)
            .collect();
        for id in &ids {
            self.cancellations.push(*id);
        }
        ids.len()
    }

    /// Protective stop currently associated with an instrument: the one
    /// staged this cycle, else a live one that survived the sweep.
    pub fn stop_for(&self, symbol: &str) -> Option<&PendingOrder> {
        self.stops
            .get(symbol)
            .or_else(|| self.live().find(|o| o.is_stop() && o.symbol() == symbol))
    }

    /// Stage the entry (or exit) order for an instrument together with its
    /// protective stop, replacing whatever was staged for it before.
    pub fn stage(&mut self, entry: PendingOrder, stop: Option<PendingOrder>) {
        let symbol = entry.symbol().to_string();
        match stop {
            Some(stop) => {
                self.stops.insert(symbol.clone(), stop);
            }
            None => {
                self.stops.remove(&symbol);
            }
        }
        self.entries.insert(symbol, entry);
    }

    /// Replace a live order with a changed copy: the original is canceled and
    /// the copy staged as that instrument's stop.
    pub fn reissue_stop(&mut self, original: OrderId, replacement: PendingOrder) {
        self.cancel(original);
        self.stops
            .insert(replacement.symbol().to_string(), replacement);
    }

    /// Stage an order on another instrument (hedge or hedge exit). A previous
    /// companion with the same instrument and role is replaced.
    pub fn stage_companion(&mut self, order: PendingOrder) {
        let role = order.order().role;
        self.companions
            .retain(|o| !(o.symbol() == order.symbol() && o.order().role == role));
        self.companions.push(order);
    }

    pub fn entry(&self, symbol: &str) -> Option<&PendingOrder> {
        self.entries.get(symbol)
    }

    pub fn companions(&self) -> &[PendingOrder] {
        &self.companions
    }

    /// Companion orders with a given role.
    pub fn companions_with_role(&self, role: OrderRole) -> impl Iterator<Item = &PendingOrder> {
        self.companions.iter().filter(move |o| o.order().role == role)
    }

    pub fn is_empty(&self) -> bool {
        self.cancellations.is_empty()
            && self.entries.is_empty()
            && self.stops.is_empty()
            && self.companions.is_empty()
    }

    /// Close the cycle: cancellations, then orders in submission order
    /// (entries, stops, companions).
    pub fn finish(self) -> (Vec<OrderId>, Vec<PendingOrder>) {
        let orders = self
            .entries
            .into_values()
            .chain(self.stops.into_values())
            .chain(self.companions)
            .collect();
        (self.cancellations, orders)
    }
}
