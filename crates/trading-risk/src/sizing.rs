//! Position sizing policies.
//!
//! A policy looks at the staged entry order, the protective stop paired with
//! it and the account, and answers with quantity patches. Sizing only
//! applies to opening actions; exits and flattens keep their quantity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::error::TradingError;
use trading_core::traits::SeriesIndicator;
use trading_core::types::{
    to_price, Action, CycleContext, Instrument, OrderPatch, PatchStage, PendingOrder, LOT_STEP,
};
use trading_indicators::Atr;

/// Hundredths of a percent to a fraction (100 = 1%).
const PERCENT_SCALE: Decimal = dec!(0.0001);

/// Quantity patches produced by a sizing policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Sizing {
    /// New position size, without the reversal quantity
    pub size: Decimal,
    /// Patch for the entry order, reversal quantity included
    pub entry: OrderPatch,
    /// Patch for the paired protective stop, new size only
    pub stop: Option<OrderPatch>,
}

/// Capability shared by every sizing policy.
pub trait PositionSizing {
    fn name(&self) -> &str;

    /// Size an entry order.
    ///
    /// Returns `None` when the policy does not apply (exit action) or a
    /// required input is missing: no stop, indicator not ready, zero risk.
    fn size(
        &self,
        ctx: &CycleContext<'_>,
        order: &PendingOrder,
        stop: Option<&PendingOrder>,
        action: Action,
    ) -> Option<Sizing>;
}

/// Position sizing method.
///
/// `percent` values are expressed in hundredths of a percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Base quantity times a fixed multiplier
    FixedUnits { multiplier: Decimal },
    /// Risk a share of equity over the stop distance
    FixedFractional { percent: Decimal },
    /// Risk a fixed currency amount over the stop distance
    FixedEquityRisk { amount: Decimal },
    /// Share of equity per pip of ATR-based volatility
    VolatilityAdjusted {
        percent: Decimal,
        period: usize,
        multiplier: Decimal,
    },
}

impl Default for SizingPolicy {
    fn default() -> Self {
        SizingPolicy::FixedFractional { percent: dec!(100) }
    }
}

impl SizingPolicy {
    pub fn validate(&self) -> Result<(), TradingError> {
        match self {
            SizingPolicy::FixedUnits { multiplier } if *multiplier <= Decimal::ZERO => {
                Err(invalid("Fixed-units multiplier must be positive"))
            }
            SizingPolicy::FixedFractional { percent } if *percent <= Decimal::ZERO => {
                Err(invalid("Fixed-fractional percent must be positive"))
            }
            SizingPolicy::FixedEquityRisk { amount } if *amount <= Decimal::ZERO => {
                Err(invalid("Fixed equity risk amount must be positive"))
            }
            SizingPolicy::VolatilityAdjusted {
                percent,
                period,
                multiplier,
            } => {
                if *percent <= Decimal::ZERO || *multiplier <= Decimal::ZERO {
                    Err(invalid("Volatility sizing percent and multiplier must be positive"))
                } else if *period == 0 {
                    Err(invalid("Volatility period must be greater than 0"))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// New size before any reversal quantity is added.
    fn new_size(
        &self,
        ctx: &CycleContext<'_>,
        instrument: &Instrument,
        order: &PendingOrder,
        stop: Option<&PendingOrder>,
    ) -> Option<Decimal> {
        let equity = ctx.account.equity;
        match self {
            SizingPolicy::FixedUnits { multiplier } => Some(order.quantity() * *multiplier),

            SizingPolicy::FixedFractional { percent } => {
                let risk = stop_risk(ctx, instrument, order, stop)?;
                Some(to_quantity(*percent * PERCENT_SCALE * equity / risk))
            }

            SizingPolicy::FixedEquityRisk { amount } => {
                let risk = stop_risk(ctx, instrument, order, stop)?;
                Some(to_quantity(*amount / risk))
            }

            SizingPolicy::VolatilityAdjusted {
                percent,
                period,
                multiplier,
            } => {
                let series = ctx.market.series(&instrument.symbol)?;
                let Some(atr) = Atr::new(*period).current(series) else {
                    debug!(symbol = %instrument.symbol, period, "ATR not ready, skipping sizing");
                    return None;
                };
                let pips = instrument
                    .to_pips(to_price(atr) * *multiplier)
                    .filter(|p| *p > Decimal::ZERO)?;
                Some(to_quantity(equity * *percent * PERCENT_SCALE / pips))
            }
        }
    }
}

impl PositionSizing for SizingPolicy {
    fn name(&self) -> &str {
        match self {
            SizingPolicy::FixedUnits { .. } => "fixed_units",
            SizingPolicy::FixedFractional { .. } => "fixed_fractional",
            SizingPolicy::FixedEquityRisk { .. } => "fixed_equity_risk",
            SizingPolicy::VolatilityAdjusted { .. } => "volatility_adjusted",
        }
    }

    fn size(
        &self,
        ctx: &CycleContext<'_>,
        order: &PendingOrder,
        stop: Option<&PendingOrder>,
        action: Action,
    ) -> Option<Sizing> {
        if !action.is_entry() {
            return None;
        }
        let symbol = order.symbol();
        let instrument = ctx.instrument(symbol)?;
        let Some(size) = self.new_size(ctx, instrument, order, stop) else {
            debug!(symbol, policy = self.name(), "Sizing inputs missing, order left unsized");
            return None;
        };

        let reversal = ctx
            .position(symbol)
            .map(|p| p.reversal_quantity(action.direction()))
            .unwrap_or_default();

        debug!(symbol, policy = self.name(), %size, %reversal, "Sized order");
        Some(Sizing {
            size,
            entry: OrderPatch::quantity(PatchStage::PositionSizing, self.name(), size + reversal),
            stop: stop.map(|_| OrderPatch::quantity(PatchStage::PositionSizing, self.name(), size)),
        })
    }
}

/// Risk of one hundredth of a lot between the entry price and the stop.
///
/// The entry price is the order's own price, else the last close.
fn stop_risk(
    ctx: &CycleContext<'_>,
    instrument: &Instrument,
    order: &PendingOrder,
    stop: Option<&PendingOrder>,
) -> Option<Decimal> {
    let stop_price = stop?.order().stop_price?;
    let price = order
        .order()
        .price()
        .or_else(|| ctx.market.last_close(&instrument.symbol))?;
    instrument.risk_per_lot(price - stop_price)
}

fn invalid(reason: &str) -> TradingError {
    TradingError::Validation(reason.to_string())
}

/// Floor a lot count toward zero and convert it to a quantity.
fn to_quantity(lots: Decimal) -> Decimal {
    lots.trunc().max(Decimal::ZERO) * LOT_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::{
        Account, Bar, Direction, InstrumentRegistry, MarketSnapshot, Order, Position,
    };

    struct Fixture {
        account: Account,
        market: MarketSnapshot,
        instruments: InstrumentRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let mut market = MarketSnapshot::new();
            market.update("EURUSD", Bar::new(0, 1.1040, 1.1060, 1.1030, 1.1050, 0.0));
            Self {
                account: Account::new(dec!(10000)),
                market,
                instruments: vec![Instrument::new("EURUSD", dec!(0.0001), dec!(10))]
                    .into_iter()
                    .collect(),
            }
        }

        fn ctx(&self) -> CycleContext<'_> {
            CycleContext::new(&self.account, &self.market, &self.instruments)
        }
    }

    fn entry(direction: Direction) -> PendingOrder {
        PendingOrder::new(Order::market("EURUSD", direction, dec!(0.01)))
    }

    fn stop(price: Decimal) -> PendingOrder {
        PendingOrder::new(Order::stop("EURUSD", Direction::Short, dec!(0.01), price))
    }

    #[test]
    fn test_fixed_fractional_eurusd_scenario() {
        let fx = Fixture::new();
        let policy = SizingPolicy::FixedFractional { percent: dec!(100) };
        let stop = stop(dec!(1.1030));

        let sizing = policy
            .size(&fx.ctx(), &entry(Direction::Long), Some(&stop), Action::OpenLong)
            .unwrap();
        assert_eq!(sizing.entry.quantity, Some(dec!(0.50)));
        assert_eq!(sizing.stop.unwrap().quantity, Some(dec!(0.50)));
        assert_eq!(sizing.entry.policy, "fixed_fractional");
    }

    #[test]
    fn test_fixed_fractional_needs_stop() {
        let fx = Fixture::new();
        let policy = SizingPolicy::FixedFractional { percent: dec!(100) };
        assert!(policy
            .size(&fx.ctx(), &entry(Direction::Long), None, Action::OpenLong)
            .is_none());
    }

    #[test]
    fn test_zero_risk_denominator_is_skipped() {
        let fx = Fixture::new();
        let stop = stop(dec!(1.1050));
        for policy in [
            SizingPolicy::FixedFractional { percent: dec!(100) },
            SizingPolicy::FixedEquityRisk { amount: dec!(100) },
        ] {
            assert!(policy
                .size(&fx.ctx(), &entry(Direction::Long), Some(&stop), Action::OpenLong)
                .is_none());
        }
    }

    #[test]
    fn test_zero_volatility_is_skipped() {
        let mut fx = Fixture::new();
        // Flat bars at the previous close: every true range is 0
        for i in 1..=4 {
            fx.market
                .update("EURUSD", Bar::new(i, 1.1050, 1.1050, 1.1050, 1.1050, 0.0));
        }
        let policy = SizingPolicy::VolatilityAdjusted {
            percent: dec!(100),
            period: 3,
            multiplier: dec!(2),
        };
        assert!(policy
            .size(&fx.ctx(), &entry(Direction::Long), None, Action::OpenLong)
            .is_none());
    }

    #[test]
    fn test_fixed_equity_risk_floors_lots() {
        let fx = Fixture::new();
        // 15 pips = 1.5 per hundredth; 100 / 1.5 = 66.67 -> 66 lots
        let policy = SizingPolicy::FixedEquityRisk { amount: dec!(100) };
        let stop = stop(dec!(1.1035));
        let sizing = policy
            .size(&fx.ctx(), &entry(Direction::Long), Some(&stop), Action::OpenLong)
            .unwrap();
        assert_eq!(sizing.entry.quantity, Some(dec!(0.66)));
    }

    #[test]
    fn test_fixed_units() {
        let fx = Fixture::new();
        let policy = SizingPolicy::FixedUnits { multiplier: dec!(5) };
        let sizing = policy
            .size(&fx.ctx(), &entry(Direction::Short), None, Action::OpenShort)
            .unwrap();
        assert_eq!(sizing.entry.quantity, Some(dec!(0.05)));
        assert!(sizing.stop.is_none());
    }

    #[test]
    fn test_reversal_adds_opposite_position_for_every_policy() {
        let mut fx = Fixture::new();
        fx.account.positions.insert(
            "EURUSD".into(),
            Position::new("EURUSD", dec!(-0.30), dec!(1.1100)),
        );
        for i in 0..8 {
            fx.market
                .update("EURUSD", Bar::new(i + 1, 1.1040, 1.1060, 1.1040, 1.1050, 0.0));
        }
        let stop = stop(dec!(1.1030));

        let policies = [
            SizingPolicy::FixedUnits { multiplier: dec!(2) },
            SizingPolicy::FixedFractional { percent: dec!(100) },
            SizingPolicy::FixedEquityRisk { amount: dec!(100) },
            SizingPolicy::VolatilityAdjusted {
                percent: dec!(100),
                period: 3,
                multiplier: dec!(1),
            },
        ];
        for policy in policies {
            let sizing = policy
                .size(&fx.ctx(), &entry(Direction::Long), Some(&stop), Action::OpenLong)
                .unwrap();
            let entry_qty = sizing.entry.quantity.unwrap();
            let stop_qty = sizing.stop.unwrap().quantity.unwrap();
            assert_eq!(entry_qty, stop_qty + dec!(0.30), "{}", policy.name());
        }
    }

    #[test]
    fn test_same_direction_position_is_not_added() {
        let mut fx = Fixture::new();
        fx.account.positions.insert(
            "EURUSD".into(),
            Position::new("EURUSD", dec!(0.30), dec!(1.1000)),
        );
        let policy = SizingPolicy::FixedUnits { multiplier: dec!(1) };
        let sizing = policy
            .size(&fx.ctx(), &entry(Direction::Long), None, Action::OpenLong)
            .unwrap();
        assert_eq!(sizing.entry.quantity, Some(dec!(0.01)));
    }

    #[test]
    fn test_volatility_adjusted_waits_for_atr() {
        let fx = Fixture::new();
        let policy = SizingPolicy::VolatilityAdjusted {
            percent: dec!(100),
            period: 14,
            multiplier: dec!(2),
        };
        assert!(policy
            .size(&fx.ctx(), &entry(Direction::Long), None, Action::OpenLong)
            .is_none());
    }

    #[test]
    fn test_volatility_adjusted_size() {
        let mut fx = Fixture::new();
        // Every bar spans 20 pips around 1.1050 with no gaps: ATR = 0.0020
        for i in 1..=4 {
            fx.market
                .update("EURUSD", Bar::new(i, 1.1050, 1.1060, 1.1040, 1.1050, 0.0));
        }
        let policy = SizingPolicy::VolatilityAdjusted {
            percent: dec!(100),
            period: 3,
            multiplier: dec!(1),
        };
        let sizing = policy
            .size(&fx.ctx(), &entry(Direction::Long), None, Action::OpenLong)
            .unwrap();
        // 1% of 10000 over 20 pips of volatility = 5 lots
        assert_eq!(sizing.entry.quantity, Some(dec!(0.05)));
        assert_eq!(sizing.size, dec!(0.05));

        let doubled = SizingPolicy::VolatilityAdjusted {
            percent: dec!(100),
            period: 3,
            multiplier: dec!(2),
        };
        let sizing = doubled
            .size(&fx.ctx(), &entry(Direction::Long), None, Action::OpenLong)
            .unwrap();
        // 100 / 40 = 2.5 -> 2 lots
        assert_eq!(sizing.entry.quantity, Some(dec!(0.02)));
    }

    #[test]
    fn test_exits_are_not_sized() {
        let fx = Fixture::new();
        let policy = SizingPolicy::FixedUnits { multiplier: dec!(3) };
        let exit = PendingOrder::new(Order::market("EURUSD", Direction::Flat, dec!(0.2)));
        assert!(policy.size(&fx.ctx(), &exit, None, Action::Flatten).is_none());
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: SizingPolicy =
            toml::from_str("[volatility_adjusted]\npercent = 50\nperiod = 14\nmultiplier = 2")
                .unwrap();
        assert_eq!(
            policy,
            SizingPolicy::VolatilityAdjusted {
                percent: dec!(50),
                period: 14,
                multiplier: dec!(2)
            }
        );
        assert!(matches!(
            SizingPolicy::FixedUnits { multiplier: Decimal::ZERO }.validate(),
            Err(TradingError::Validation(_))
        ));
    }
}
