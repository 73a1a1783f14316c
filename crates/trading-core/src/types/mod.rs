//! Core data types for the decision and order pipeline.

mod book;
mod context;
mod decision;
mod instrument;
mod market;
mod ohlcv;
mod order;
mod position;

pub use book::{CycleBook, SweepScope};
pub use context::CycleContext;
pub use decision::{Action, AgentState, DecisionSet};
pub use instrument::{Instrument, InstrumentRegistry, LOT_STEP};
pub use market::MarketSnapshot;
pub use ohlcv::{to_price, Bar, BarSeries, PRICE_DP};
pub use order::{
    Direction, Order, OrderCosts, OrderId, OrderKind, OrderPatch, OrderRole, OrderTicket,
    PatchStage, PendingOrder,
};
pub use position::{Account, Position};
