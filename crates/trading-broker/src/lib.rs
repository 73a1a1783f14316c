//! Execution gateways and broker cost models.

mod cost;
mod paper;

pub use cost::{BrokerProfile, CostModel, ForexProfile, GenericProfile};
pub use paper::{Fill, PaperBroker};
