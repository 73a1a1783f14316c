//! Broker cost models.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;
use trading_core::types::{Order, OrderCosts};

/// Costs a broker charges for an order. Every method is a pure function of
/// the order.
pub trait CostModel {
    /// Commission in account currency.
    fn commission(&self, order: &Order) -> Decimal;

    /// Spread in pips.
    fn spread(&self, order: &Order) -> Decimal;

    /// Expected slippage in pips.
    fn slippage(&self, order: &Order) -> Decimal;

    /// Expected delay between submission and execution.
    fn latency_ms(&self, order: &Order) -> u64;

    fn costs(&self, order: &Order) -> OrderCosts {
        OrderCosts {
            commission: self.commission(order),
            spread: self.spread(order),
            slippage: self.slippage(order),
            latency_ms: self.latency_ms(order),
        }
    }
}

/// Flat per-lot commission with configured spread, slippage and latency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericProfile {
    pub commission_per_lot: Decimal,
    pub spread: Decimal,
    pub slippage: Decimal,
    pub latency_ms: u64,
}

impl Default for GenericProfile {
    fn default() -> Self {
        Self {
            commission_per_lot: Decimal::ZERO,
            spread: Decimal::ZERO,
            slippage: Decimal::ZERO,
            latency_ms: 0,
        }
    }
}

/// Retail forex broker: majors are cheaper per lot than everything else,
/// and every ticket pays a fixed fee on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForexProfile {
    pub majors: Vec<String>,
    pub majors_rate: Decimal,
    pub other_rate: Decimal,
    pub ticket_fee: Decimal,
    pub spread: Decimal,
    pub slippage: Decimal,
    pub latency_ms: u64,
}

impl Default for ForexProfile {
    fn default() -> Self {
        Self {
            majors: ["EURUSD", "GBPUSD", "USDJPY", "USDCHF", "AUDUSD", "USDCAD", "NZDUSD"]
                .into_iter()
                .map(String::from)
                .collect(),
            majors_rate: dec!(5),
            other_rate: dec!(8),
            ticket_fee: dec!(1),
            spread: dec!(1.2),
            slippage: dec!(0.5),
            latency_ms: 50,
        }
    }
}

impl ForexProfile {
    pub fn is_major(&self, symbol: &str) -> bool {
        self.majors.iter().any(|m| m == symbol)
    }
}

/// Broker profile selected in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerProfile {
    Generic(GenericProfile),
    Forex(ForexProfile),
}

impl Default for BrokerProfile {
    fn default() -> Self {
        BrokerProfile::Forex(ForexProfile::default())
    }
}

impl BrokerProfile {
    pub fn name(&self) -> &str {
        match self {
            BrokerProfile::Generic(_) => "generic",
            BrokerProfile::Forex(_) => "forex",
        }
    }

    pub fn validate(&self) -> Result<(), TradingError> {
        let (amounts, label) = match self {
            BrokerProfile::Generic(p) => (
                vec![p.commission_per_lot, p.spread, p.slippage],
                "generic",
            ),
            BrokerProfile::Forex(p) => (
                vec![p.majors_rate, p.other_rate, p.ticket_fee, p.spread, p.slippage],
                "forex",
            ),
        };
        if amounts.iter().any(|a| *a < Decimal::ZERO) {
            return Err(TradingError::Validation(format!(
                "{label} broker costs must not be negative"
            )));
        }
        Ok(())
    }
}

impl CostModel for BrokerProfile {
    fn commission(&self, order: &Order) -> Decimal {
        match self {
            BrokerProfile::Generic(p) => p.commission_per_lot * order.quantity,
            BrokerProfile::Forex(p) => {
                let rate = if p.is_major(&order.symbol) {
                    p.majors_rate
                } else {
                    p.other_rate
                };
                rate * order.quantity + p.ticket_fee
            }
        }
    }

    fn spread(&self, _order: &Order) -> Decimal {
        match self {
            BrokerProfile::Generic(p) => p.spread,
            BrokerProfile::Forex(p) => p.spread,
        }
    }

    fn slippage(&self, _order: &Order) -> Decimal {
        match self {
            BrokerProfile::Generic(p) => p.slippage,
            BrokerProfile::Forex(p) => p.slippage,
        }
    }

    fn latency_ms(&self, _order: &Order) -> u64 {
        match self {
            BrokerProfile::Generic(p) => p.latency_ms,
            BrokerProfile::Forex(p) => p.latency_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::Direction;

    #[test]
    fn test_forex_commission_by_classification() {
        let profile = BrokerProfile::default();
        let major = Order::market("EURUSD", Direction::Long, dec!(0.50));
        let minor = Order::market("EURNOK", Direction::Long, dec!(0.50));

        assert_eq!(profile.commission(&major), dec!(3.5)); // 5 x 0.5 + 1
        assert_eq!(profile.commission(&minor), dec!(5)); // 8 x 0.5 + 1
    }

    #[test]
    fn test_generic_profile_costs() {
        let profile = BrokerProfile::Generic(GenericProfile {
            commission_per_lot: dec!(7),
            spread: dec!(2),
            slippage: dec!(1),
            latency_ms: 120,
        });
        let order = Order::market("XAUUSD", Direction::Short, dec!(0.20));
        let costs = profile.costs(&order);

        assert_eq!(costs.commission, dec!(1.4));
        assert_eq!(costs.spread, dec!(2));
        assert_eq!(costs.slippage, dec!(1));
        assert_eq!(costs.latency_ms, 120);
    }

    #[test]
    fn test_zero_quantity_still_pays_ticket_fee() {
        let profile = BrokerProfile::default();
        let order = Order::market("EURUSD", Direction::Long, Decimal::ZERO);
        assert_eq!(profile.commission(&order), dec!(1));
    }

    #[test]
    fn test_profile_from_toml() {
        let profile: BrokerProfile =
            toml::from_str("[forex]\nmajors = [\"EURUSD\"]\nticket_fee = 0\n").unwrap();
        let BrokerProfile::Forex(forex) = &profile else {
            panic!("expected forex profile");
        };
        assert!(forex.is_major("EURUSD"));
        assert!(!forex.is_major("GBPUSD"));
        assert_eq!(forex.majors_rate, dec!(5));
        assert!(profile.validate().is_ok());

        let negative = BrokerProfile::Generic(GenericProfile {
            spread: dec!(-1),
            ..Default::default()
        });
        assert!(matches!(negative.validate(), Err(TradingError::Validation(_))));
    }
}
