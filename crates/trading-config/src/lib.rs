//! Configuration management.
//!
//! Settings come from a TOML file, overridden by `TRADING__*` environment
//! variables (`TRADING__BACKTEST__INITIAL_CAPITAL=50000`).

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, DataFile, LoggingConfig, ModuleSettings,
};

use config::{Config, Environment, File};
use std::path::Path;
use trading_core::error::{TradingError, TradingResult};

/// Load configuration from file and environment, then validate it.
pub fn load_config(path: &Path) -> TradingResult<AppConfig> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| TradingError::Config(e.to_string()))?;

    let app: AppConfig = config
        .try_deserialize()
        .map_err(|e| TradingError::Config(e.to_string()))?;
    app.validate()?;
    Ok(app)
}
