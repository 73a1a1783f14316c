//! Per-bar decision pipeline.
//!
//! Votes are aggregated into one action per instrument, each action is
//! turned into a pending order, run through the configured risk policy and
//! then the sizing policy, and every staged order is priced by the broker
//! cost model before it is handed to the gateway.

mod aggregator;
mod orchestrator;

pub use aggregator::aggregate;
pub use orchestrator::{CycleOutcome, Orchestrator};
