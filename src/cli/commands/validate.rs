//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::AppConfig;
use trading_core::error::TradingResult;
use trading_risk::{PositionSizing, RiskManagement};

pub fn run(config_path: &Path, config: TradingResult<AppConfig>) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {e}");
            return Err(e.into());
        }
    };

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {} ({})", config.logging.level, config.logging.format);
    println!(
        "Instruments: {}",
        config
            .instruments
            .iter()
            .map(|i| i.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    for module in &config.modules {
        println!("Module: {} on {}", module.kind, module.symbols.join(", "));
    }
    println!("Sizing: {}", config.sizing.name());
    println!("Risk: {}", config.risk.name());
    println!("Broker: {}", config.broker.name());
    println!("Initial capital: {}", config.backtest.initial_capital);
    Ok(())
}
