//! Backtesting engine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};
use trading_broker::PaperBroker;
use trading_core::error::TradingResult;
use trading_core::traits::{DecisionModule, ExecutionGateway, MarketView};
use trading_core::types::{Bar, CycleContext, DecisionSet, InstrumentRegistry, MarketSnapshot};
use trading_pipeline::Orchestrator;
use trading_risk::{PositionSizing, RiskManagement};

use crate::report::BacktestReport;
use crate::statistics::BacktestStats;

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    /// Bars kept per instrument for indicators and correlation
    pub history: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            history: 500,
        }
    }
}

/// Replays historical bars through the decision pipeline.
///
/// Bars sharing a timestamp form one step: resting orders are filled
/// against them, the market snapshot is updated, every module votes on the
/// instruments that printed, and one decision cycle runs. Orders produced
/// by a cycle execute from the next bar of their instrument.
pub struct BacktestEngine {
    config: BacktestConfig,
    instruments: InstrumentRegistry,
    orchestrator: Orchestrator,
}

impl BacktestEngine {
    pub fn new(
        config: BacktestConfig,
        instruments: InstrumentRegistry,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            config,
            instruments,
            orchestrator,
        }
    }

    /// Run a backtest over `data`, keyed by symbol.
    pub async fn run(
        &mut self,
        modules: &mut [Box<dyn DecisionModule>],
        data: HashMap<String, Vec<Bar>>,
    ) -> TradingResult<BacktestReport> {
        let broker = PaperBroker::new(
            self.config.initial_capital,
            self.instruments.clone(),
            self.orchestrator.costs().clone(),
        );
        let mut stats = BacktestStats::new(self.config.initial_capital);
        let mut market = MarketSnapshot::with_capacity(self.config.history);

        let mut timeline: BTreeMap<i64, Vec<(String, Bar)>> = BTreeMap::new();
        for (symbol, bars) in data {
            if !self.instruments.contains(&symbol) {
                warn!(symbol = %symbol, "No instrument reference data, bars ignored");
                continue;
            }
            for bar in bars {
                timeline
                    .entry(bar.timestamp)
                    .or_default()
                    .push((symbol.clone(), bar));
            }
        }
        for bars in timeline.values_mut() {
            bars.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let registered: BTreeSet<String> = modules
            .iter()
            .flat_map(|m| m.symbols().iter().cloned())
            .collect();

        info!(
            steps = timeline.len(),
            modules = modules.len(),
            risk = %self.orchestrator.risk().name(),
            sizing = %self.orchestrator.sizing().name(),
            broker = %self.orchestrator.costs().name(),
            "Starting backtest"
        );

        for (timestamp, bars) in timeline {
            for (symbol, bar) in &bars {
                for fill in broker.on_bar(symbol, bar).await {
                    stats.record_fill(&fill);
                }
                market.update(symbol, *bar);
            }

            let mut decisions = DecisionSet::with_instruments(registered.iter().cloned());
            for module in modules.iter_mut() {
                let symbols = module.symbols().to_vec();
                for symbol in symbols {
                    if !bars.iter().any(|(s, _)| *s == symbol) {
                        continue;
                    }
                    if let Some(series) = market.series(&symbol) {
                        let vote = module.evaluate(series);
                        decisions.cast(&symbol, vote)?;
                    }
                }
            }

            let account = broker.account().await?;
            let ctx = CycleContext::new(&account, &market, &self.instruments);
            let outcome = self.orchestrator.run_cycle(&ctx, &decisions);

            for id in outcome.cancellations {
                match broker.cancel_order(id).await {
                    Ok(()) => stats.orders_canceled += 1,
                    Err(e) => warn!(%id, error = %e, "Cancel failed"),
                }
            }
            for ticket in outcome.tickets {
                match broker.submit_order(ticket.order).await {
                    Ok(id) => {
                        debug!(%id, commission = %ticket.costs.commission, "Order submitted");
                        stats.orders_submitted += 1;
                    }
                    Err(e) => warn!(error = %e, "Order rejected"),
                }
            }

            stats.record_equity(timestamp, broker.snapshot().await.equity);
        }

        let final_account = broker.snapshot().await;
        stats.finalize(&final_account);
        info!(
            equity = %final_account.equity,
            trades = stats.total_trades,
            "Backtest finished"
        );

        Ok(BacktestReport {
            config: self.config.clone(),
            stats,
            final_account,
        })
    }
}
