//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use trading_broker::BrokerProfile;
use trading_core::error::{TradingError, TradingResult};
use trading_core::types::{Instrument, InstrumentRegistry};
use trading_monitor::LogFormat;
use trading_risk::{RiskPolicy, SizingPolicy};
use trading_strategies::ModuleRegistry;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Reference data of every tradable instrument
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    /// Decision modules voting each bar
    #[serde(default)]
    pub modules: Vec<ModuleSettings>,
    #[serde(default)]
    pub sizing: SizingPolicy,
    #[serde(default)]
    pub risk: RiskPolicy,
    #[serde(default)]
    pub broker: BrokerProfile,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trading-desk".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// One decision module instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSettings {
    /// Registry kind, e.g. `ma_crossover`
    pub kind: String,
    pub symbols: Vec<String>,
    /// Module parameters; missing ones take their defaults
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

/// Historical data for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFile {
    pub symbol: String,
    pub path: PathBuf,
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: Decimal,
    /// Bars kept per instrument
    pub history: usize,
    pub data: Vec<DataFile>,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            history: 500,
            data: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Instrument lookup table built from the configured reference data.
    pub fn instrument_registry(&self) -> InstrumentRegistry {
        self.instruments.iter().cloned().collect()
    }

    /// Check that every reference in the configuration resolves.
    pub fn validate(&self) -> TradingResult<()> {
        if self.instruments.is_empty() {
            return Err(TradingError::Config("No instruments configured".into()));
        }
        let mut symbols = BTreeSet::new();
        for instrument in &self.instruments {
            instrument.validate()?;
            if !symbols.insert(instrument.symbol.as_str()) {
                return Err(TradingError::Config(format!(
                    "Instrument {} configured twice",
                    instrument.symbol
                )));
            }
        }
        let known = |symbol: &str, context: &str| {
            if symbols.contains(symbol) {
                Ok(())
            } else {
                Err(TradingError::Config(format!(
                    "{context} references unknown instrument {symbol}"
                )))
            }
        };

        let registry = ModuleRegistry::new();
        for module in &self.modules {
            if !registry.exists(&module.kind) {
                return Err(TradingError::Config(format!(
                    "Unknown decision module kind: {}",
                    module.kind
                )));
            }
            if module.symbols.is_empty() {
                return Err(TradingError::Config(format!(
                    "Module {} trades no instruments",
                    module.kind
                )));
            }
            for symbol in &module.symbols {
                known(symbol, &format!("Module {}", module.kind))?;
            }
        }

        self.sizing.validate()?;
        self.risk.validate()?;
        self.broker.validate()?;
        if let RiskPolicy::CorrelationHedge(hedger) = &self.risk {
            known(&hedger.primary, "Hedge primary")?;
            for symbol in &hedger.basket {
                known(symbol, "Hedge basket")?;
            }
        }

        if self.backtest.initial_capital <= Decimal::ZERO {
            return Err(TradingError::Config("Initial capital must be positive".into()));
        }
        for file in &self.backtest.data {
            known(&file.symbol, "Backtest data")?;
        }
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> TradingResult<String> {
        toml::to_string_pretty(self).map_err(|e| TradingError::Serialization(e.to_string()))
    }
}
