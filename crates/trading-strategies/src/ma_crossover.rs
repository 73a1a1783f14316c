//! Moving average crossover voter.
//!
//! Votes to enter when the fast MA crosses the slow MA, and to exit a
//! position that is on the wrong side of the current trend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;
use trading_core::{
    error::ModuleError,
    traits::{DecisionModule, ModuleConfig, ModuleState, SeriesIndicator},
    types::{AgentState, BarSeries},
};
use trading_indicators::{Ema, Sma};

/// Configuration for the MA crossover voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossoverConfig {
    /// Symbols to vote on
    pub symbols: Vec<String>,
    pub fast_period: usize,
    pub slow_period: usize,
    /// Use EMA instead of SMA
    pub use_ema: bool,
    /// Minimum relative gap between the averages for an entry vote
    pub threshold: f64,
}

impl Default for MaCrossoverConfig {
    fn default() -> Self {
        Self {
            symbols: vec![],
            fast_period: 12,
            slow_period: 26,
            use_ema: true,
            threshold: 0.0,
        }
    }
}

impl ModuleConfig for MaCrossoverConfig {
    fn validate(&self) -> Result<(), ModuleError> {
        if self.fast_period == 0 {
            return Err(ModuleError::InvalidConfig(
                "Fast period must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(ModuleError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        if self.threshold < 0.0 {
            return Err(ModuleError::InvalidConfig("Threshold must not be negative".into()));
        }
        if self.symbols.is_empty() {
            return Err(ModuleError::InvalidConfig(
                "At least one symbol required".into(),
            ));
        }
        Ok(())
    }
}

/// Moving average crossover voter.
pub struct MaCrossover {
    config: MaCrossoverConfig,
    bars_processed: usize,
    votes_cast: usize,
    /// Latest (fast, slow) per symbol
    latest: HashMap<String, (f64, f64)>,
}

impl MaCrossover {
    pub fn new(config: MaCrossoverConfig) -> Self {
        Self {
            config,
            bars_processed: 0,
            votes_cast: 0,
            latest: HashMap::new(),
        }
    }

    fn average(&self, series: &BarSeries, period: usize, offset: usize) -> Option<f64> {
        if self.config.use_ema {
            Ema::new(period).value_at(series, offset)
        } else {
            Sma::new(period).value_at(series, offset)
        }
    }

    fn vote(&self, fast: (f64, f64), slow: (f64, f64)) -> AgentState {
        let (prev_fast, fast) = fast;
        let (prev_slow, slow) = slow;
        let gap = if slow != 0.0 { ((fast - slow) / slow).abs() } else { 0.0 };

        if prev_fast <= prev_slow && fast > slow && gap >= self.config.threshold {
            AgentState::EntryLong
        } else if prev_fast >= prev_slow && fast < slow && gap >= self.config.threshold {
            AgentState::EntryShort
        } else if fast < slow {
            AgentState::ExitLong
        } else if fast > slow {
            AgentState::ExitShort
        } else {
            AgentState::NoAction
        }
    }
}

impl DecisionModule for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn description(&self) -> &str {
        "Votes on fast/slow moving average crossovers"
    }

    fn evaluate(&mut self, series: &BarSeries) -> AgentState {
        self.bars_processed += 1;

        let (fast, slow) = (self.config.fast_period, self.config.slow_period);
        let values = (
            self.average(series, fast, 1),
            self.average(series, fast, 0),
            self.average(series, slow, 1),
            self.average(series, slow, 0),
        );
        let (Some(prev_fast), Some(cur_fast), Some(prev_slow), Some(cur_slow)) = values else {
            return AgentState::NoAction;
        };

        self.latest
            .insert(series.symbol.clone(), (cur_fast, cur_slow));
        let vote = self.vote((prev_fast, cur_fast), (prev_slow, cur_slow));
        if vote != AgentState::NoAction {
            self.votes_cast += 1;
        }
        trace!(
            symbol = %series.symbol,
            fast = cur_fast,
            slow = cur_slow,
            %vote,
            "MA crossover vote"
        );
        vote
    }

    fn reset(&mut self) {
        self.bars_processed = 0;
        self.votes_cast = 0;
        self.latest.clear();
    }

    fn state(&self) -> ModuleState {
        let mut indicators = HashMap::new();
        for (symbol, (fast, slow)) in &self.latest {
            indicators.insert(format!("{symbol}.fast_ma"), *fast);
            indicators.insert(format!("{symbol}.slow_ma"), *slow);
        }
        ModuleState {
            name: self.name().to_string(),
            is_warmed_up: self.config.symbols.iter().all(|s| self.latest.contains_key(s)),
            bars_processed: self.bars_processed,
            votes_cast: self.votes_cast,
            indicators,
        }
    }

    /// One extra bar so the previous averages exist too.
    fn warmup_period(&self) -> usize {
        self.config.slow_period + 1
    }

    fn symbols(&self) -> &[String] {
        &self.config.symbols
    }
}
