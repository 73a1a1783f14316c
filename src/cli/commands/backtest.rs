//! Backtest command implementation.

use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;
use trading_backtest::{BacktestConfig, BacktestEngine};
use trading_config::AppConfig;
use trading_core::traits::DecisionModule;
use trading_core::types::Bar;
use trading_data::load_csv;
use trading_pipeline::Orchestrator;
use trading_strategies::ModuleRegistry;

use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, config: AppConfig) -> Result<()> {
    let registry = ModuleRegistry::new();
    let mut modules: Vec<Box<dyn DecisionModule>> = config
        .modules
        .iter()
        .map(|m| {
            registry
                .create(&m.kind, m.params.clone(), m.symbols.clone())
                .with_context(|| format!("Failed to create module {}", m.kind))
        })
        .collect::<Result<_>>()?;
    if modules.is_empty() {
        anyhow::bail!("No decision modules configured");
    }

    let data = load_data(&config, args.data.as_deref())?;

    let backtest_config = BacktestConfig {
        initial_capital: args.capital.unwrap_or(config.backtest.initial_capital),
        history: config.backtest.history,
    };
    let orchestrator = Orchestrator::new(
        config.risk.clone(),
        config.sizing.clone(),
        config.broker.clone(),
    );
    let mut engine =
        BacktestEngine::new(backtest_config, config.instrument_registry(), orchestrator);
    let report = engine
        .run(&mut modules, data)
        .await
        .context("Backtest failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(path) = &args.save {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    if let Some(path) = &args.equity_csv {
        std::fs::write(path, report.equity_to_csv())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Equity curve saved");
    }

    Ok(())
}

/// Load configured data files, then look in `dir` for any traded instrument
/// still missing (`EURUSD.csv`, `eurusd.csv`, `EURUSD_daily.csv`).
fn load_data(config: &AppConfig, dir: Option<&Path>) -> Result<HashMap<String, Vec<Bar>>> {
    let mut data = HashMap::new();
    for file in &config.backtest.data {
        let bars = load_csv(&file.symbol, &file.path)
            .with_context(|| format!("Failed to load {}", file.path.display()))?;
        data.insert(file.symbol.clone(), bars);
    }

    if let Some(dir) = dir {
        if !dir.is_dir() {
            anyhow::bail!("Data path '{}' is not a directory", dir.display());
        }
        let traded: BTreeSet<&String> = config.modules.iter().flat_map(|m| &m.symbols).collect();
        for symbol in traded {
            if data.contains_key(symbol) {
                continue;
            }
            let lower = symbol.to_lowercase();
            let candidates = [
                dir.join(format!("{symbol}.csv")),
                dir.join(format!("{lower}.csv")),
                dir.join(format!("{symbol}_daily.csv")),
                dir.join(format!("{lower}_daily.csv")),
            ];
            if let Some(path) = candidates.iter().find(|p| p.exists()) {
                let bars = load_csv(symbol, path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                data.insert(symbol.clone(), bars);
            }
        }
    }

    if data.is_empty() {
        anyhow::bail!("No data loaded; configure [backtest] data files or pass --data <dir>");
    }
    info!(instruments = data.len(), "Loaded market data");
    Ok(data)
}
