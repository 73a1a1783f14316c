//! Trading desk CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use trading_config::load_config;
use trading_monitor::{setup_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config);

    // Flags win over the configuration file
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or(logging.level);
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        logging.format
    };
    setup_logging(&level, format)?;

    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, config?).await,
        Commands::Modules => cli::commands::modules::run(),
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config, config),
    }
}
