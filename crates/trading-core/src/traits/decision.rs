//! Decision module trait definitions.

use crate::error::ModuleError;
use crate::types::{AgentState, BarSeries};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration trait for decision modules.
pub trait ModuleConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), ModuleError>;
}

/// State of a decision module for monitoring and serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleState {
    pub name: String,
    /// Whether every traded symbol has seen enough bars to vote
    pub is_warmed_up: bool,
    /// Number of bars evaluated, across all symbols
    pub bars_processed: usize,
    /// Number of votes other than `NoAction`
    pub votes_cast: usize,
    /// Latest indicator values, keyed by `symbol.indicator`
    pub indicators: HashMap<String, f64>,
}

impl Default for ModuleState {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_warmed_up: false,
            bars_processed: 0,
            votes_cast: 0,
            indicators: HashMap::new(),
        }
    }
}

/// An independent voter in the decision cycle.
///
/// Each bar, every module is asked for one vote per instrument it trades.
/// The votes of all modules are then reduced to a single action by the
/// aggregator, so a module never needs to know about the others.
pub trait DecisionModule: Send + Sync {
    /// Get the unique name of this module.
    fn name(&self) -> &str;

    /// Evaluate the latest bar of `series` and vote.
    ///
    /// Modules keep per-symbol state keyed by `series.symbol`.
    fn evaluate(&mut self, series: &BarSeries) -> AgentState;

    /// Reset all per-symbol state.
    fn reset(&mut self);

    /// Get the current module state for monitoring.
    fn state(&self) -> ModuleState;

    /// Number of bars needed before the module casts anything but `NoAction`.
    fn warmup_period(&self) -> usize;

    /// Get the symbols this module votes on.
    fn symbols(&self) -> &[String];

    /// Check if the module is warmed up (has enough data).
    fn is_warmed_up(&self, bars_available: usize) -> bool {
        bars_available >= self.warmup_period()
    }

    fn description(&self) -> &str {
        ""
    }
}
