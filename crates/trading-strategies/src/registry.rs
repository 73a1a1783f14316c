//! Registry of decision modules buildable from configuration.

use crate::{MaCrossover, MaCrossoverConfig, RsiConfig, RsiReversal};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trading_core::{
    error::ModuleError,
    traits::{DecisionModule, ModuleConfig},
};

/// Information about a registered module kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Kind used in configuration
    pub kind: String,
    pub description: String,
    /// Default parameters as JSON
    pub default_params: serde_json::Value,
}

/// Registry for the built-in decision modules.
///
/// Modules are resolved by kind once, when configuration is loaded.
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleInfo>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        let mut modules = BTreeMap::new();
        let mut register = |kind: &str, description: &str, defaults: serde_json::Value| {
            modules.insert(
                kind.to_string(),
                ModuleInfo {
                    kind: kind.to_string(),
                    description: description.to_string(),
                    default_params: defaults,
                },
            );
        };

        register(
            "ma_crossover",
            "Votes on fast/slow moving average crossovers",
            serde_json::to_value(MaCrossoverConfig::default()).unwrap_or_default(),
        );
        register(
            "rsi",
            "Votes on RSI overbought/oversold reversals",
            serde_json::to_value(RsiConfig::default()).unwrap_or_default(),
        );

        Self { modules }
    }

    /// List all module kinds, sorted by kind.
    pub fn list(&self) -> Vec<&ModuleInfo> {
        self.modules.values().collect()
    }

    pub fn get(&self, kind: &str) -> Option<&ModuleInfo> {
        self.modules.get(kind)
    }

    pub fn exists(&self, kind: &str) -> bool {
        self.modules.contains_key(kind)
    }

    /// Build a module from its kind, parameters and traded symbols.
    ///
    /// Missing parameters take their defaults; `symbols` always overrides
    /// any symbol list found in `params`.
    pub fn create(
        &self,
        kind: &str,
        params: serde_json::Value,
        symbols: Vec<String>,
    ) -> Result<Box<dyn DecisionModule>, ModuleError> {
        match kind {
            "ma_crossover" => {
                let mut config: MaCrossoverConfig = parse(params)?;
                config.symbols = symbols;
                config.validate()?;
                Ok(Box::new(MaCrossover::new(config)))
            }
            "rsi" => {
                let mut config: RsiConfig = parse(params)?;
                config.symbols = symbols;
                config.validate()?;
                Ok(Box::new(RsiReversal::new(config)))
            }
            _ => Err(ModuleError::NotFound(kind.to_string())),
        }
    }

    /// Build a module with default parameters.
    pub fn create_default(
        &self,
        kind: &str,
        symbols: Vec<String>,
    ) -> Result<Box<dyn DecisionModule>, ModuleError> {
        let info = self
            .get(kind)
            .ok_or_else(|| ModuleError::NotFound(kind.to_string()))?;
        self.create(kind, info.default_params.clone(), symbols)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, ModuleError> {
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| ModuleError::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eurusd() -> Vec<String> {
        vec!["EURUSD".to_string()]
    }

    #[test]
    fn test_registry_list_is_sorted() {
        let registry = ModuleRegistry::new();
        let kinds: Vec<_> = registry.list().iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["ma_crossover", "rsi"]);
    }

    #[test]
    fn test_create_default() {
        let registry = ModuleRegistry::new();
        let module = registry.create_default("ma_crossover", eurusd()).unwrap();
        assert_eq!(module.name(), "ma_crossover");
        assert_eq!(module.symbols(), &eurusd());
    }

    #[test]
    fn test_create_with_partial_params() {
        let registry = ModuleRegistry::new();
        let params = serde_json::json!({ "fast_period": 5, "slow_period": 20 });
        let module = registry.create("ma_crossover", params, eurusd()).unwrap();
        assert_eq!(module.warmup_period(), 21);

        let module = registry.create("rsi", serde_json::Value::Null, eurusd()).unwrap();
        assert_eq!(module.warmup_period(), 16);
    }

    #[test]
    fn test_create_rejects_invalid_params() {
        let registry = ModuleRegistry::new();
        let params = serde_json::json!({ "fast_period": 30, "slow_period": 20 });
        assert!(matches!(
            registry.create("ma_crossover", params, eurusd()),
            Err(ModuleError::InvalidConfig(_))
        ));
        assert!(registry.create_default("rsi", vec![]).is_err());
    }

    #[test]
    fn test_create_unknown_kind() {
        let registry = ModuleRegistry::new();
        assert!(matches!(
            registry.create_default("momentum", eurusd()),
            Err(ModuleError::NotFound(_))
        ));
    }
}
