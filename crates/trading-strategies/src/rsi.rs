//! RSI reversal voter.
//!
//! Votes long when RSI climbs back above the oversold level and short when
//! it falls back below the overbought level. Longs are exited once RSI
//! reaches `exit_long`, shorts once it drops to `exit_short`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;
use trading_core::{
    error::ModuleError,
    traits::{DecisionModule, ModuleConfig, ModuleState, SeriesIndicator},
    types::{AgentState, BarSeries},
};
use trading_indicators::Rsi;

/// Configuration for the RSI voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub symbols: Vec<String>,
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub exit_long: f64,
    pub exit_short: f64,
    /// Vote `EntryShort` on overbought reversals
    pub allow_short: bool,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            symbols: vec![],
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
            exit_long: 70.0,
            exit_short: 30.0,
            allow_short: true,
        }
    }
}

impl ModuleConfig for RsiConfig {
    fn validate(&self) -> Result<(), ModuleError> {
        if self.period < 2 {
            return Err(ModuleError::InvalidConfig(
                "RSI period must be at least 2".into(),
            ));
        }
        if self.overbought <= self.oversold {
            return Err(ModuleError::InvalidConfig(
                "Overbought must be greater than oversold".into(),
            ));
        }
        let levels = [self.overbought, self.oversold, self.exit_long, self.exit_short];
        if levels.iter().any(|l| !(0.0..=100.0).contains(l)) {
            return Err(ModuleError::InvalidConfig(
                "RSI levels must be between 0 and 100".into(),
            ));
        }
        if self.symbols.is_empty() {
            return Err(ModuleError::InvalidConfig(
                "At least one symbol required".into(),
            ));
        }
        Ok(())
    }
}

/// RSI reversal voter.
pub struct RsiReversal {
    config: RsiConfig,
    rsi: Rsi,
    bars_processed: usize,
    votes_cast: usize,
    latest: HashMap<String, f64>,
}

impl RsiReversal {
    pub fn new(config: RsiConfig) -> Self {
        Self {
            rsi: Rsi::new(config.period),
            config,
            bars_processed: 0,
            votes_cast: 0,
            latest: HashMap::new(),
        }
    }

    fn vote(&self, prev: f64, current: f64) -> AgentState {
        let cfg = &self.config;
        if prev <= cfg.oversold && current > cfg.oversold {
            AgentState::EntryLong
        } else if cfg.allow_short && prev >= cfg.overbought && current < cfg.overbought {
            AgentState::EntryShort
        } else if current >= cfg.exit_long {
            AgentState::ExitLong
        } else if current <= cfg.exit_short {
            AgentState::ExitShort
        } else {
            AgentState::NoAction
        }
    }
}

impl DecisionModule for RsiReversal {
    fn name(&self) -> &str {
        "rsi"
    }

    fn description(&self) -> &str {
        "Votes on RSI overbought/oversold reversals"
    }

    fn evaluate(&mut self, series: &BarSeries) -> AgentState {
        self.bars_processed += 1;

        let (Some(prev), Some(current)) = (
            self.rsi.value_at(series, 1),
            self.rsi.value_at(series, 0),
        ) else {
            return AgentState::NoAction;
        };

        self.latest.insert(series.symbol.clone(), current);
        let vote = self.vote(prev, current);
        if vote != AgentState::NoAction {
            self.votes_cast += 1;
        }
        trace!(symbol = %series.symbol, rsi = current, %vote, "RSI vote");
        vote
    }

    fn reset(&mut self) {
        self.bars_processed = 0;
        self.votes_cast = 0;
        self.latest.clear();
    }

    fn state(&self) -> ModuleState {
        ModuleState {
            name: self.name().to_string(),
            is_warmed_up: self.config.symbols.iter().all(|s| self.latest.contains_key(s)),
            bars_processed: self.bars_processed,
            votes_cast: self.votes_cast,
            indicators: self
                .latest
                .iter()
                .map(|(symbol, rsi)| (format!("{symbol}.rsi"), *rsi))
                .collect(),
        }
    }

    fn warmup_period(&self) -> usize {
        self.config.period + 2
    }

    fn symbols(&self) -> &[String] {
        &self.config.symbols
    }
}
