//! Risk and money management for the order pipeline.
//!
//! Provides the position-sizing policies, the fixed-distance stop policy and
//! the correlation hedger, each selected from configuration as a tagged
//! variant and dispatched through a trait.

mod correlation;
mod fixed_stop;
mod hedge;
mod policy;
mod sizing;

pub use correlation::{pearson, CorrelationTable, DEFAULT_WINDOW};
pub use fixed_stop::{FixedStop, StopSweep};
pub use hedge::CorrelationHedger;
pub use policy::{RiskManagement, RiskPolicy};
pub use sizing::{PositionSizing, Sizing, SizingPolicy};
