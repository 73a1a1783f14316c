//! Seams between the pipeline and its collaborators.

mod decision;
mod gateway;
mod indicator;
mod market;

pub use decision::{DecisionModule, ModuleConfig, ModuleState};
pub use gateway::ExecutionGateway;
pub use indicator::{Indicator, SeriesIndicator};
pub use market::MarketView;
