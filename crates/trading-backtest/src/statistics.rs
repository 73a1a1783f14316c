//! Backtest statistics.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_broker::Fill;
use trading_core::types::{Account, Direction, OrderRole};

/// Record of a single fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub direction: Direction,
    pub role: OrderRole,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Realized result when the fill reduced a position
    pub pnl: Option<Decimal>,
}

impl From<&Fill> for TradeRecord {
    fn from(fill: &Fill) -> Self {
        Self {
            symbol: fill.symbol.clone(),
            direction: fill.direction,
            role: fill.role,
            quantity: fill.quantity,
            price: fill.price,
            commission: fill.commission,
            timestamp: DateTime::from_timestamp_millis(fill.timestamp)
                .unwrap_or(DateTime::UNIX_EPOCH),
            pnl: (!fill.realized_pnl.is_zero()).then_some(fill.realized_pnl),
        }
    }
}

/// Backtest statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestStats {
    pub initial_capital: Decimal,
    pub final_equity: Decimal,
    pub total_return_pct: Decimal,
    /// Annualized return percentage (daily bars assumed)
    pub annualized_return_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    /// Sharpe ratio (assuming risk-free rate of 0)
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Number of fills
    pub total_trades: usize,
    /// Fills that closed part of a position
    pub closing_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winning share of closing trades
    pub win_rate_pct: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    /// Profit factor (gross profit / gross loss)
    pub profit_factor: Decimal,
    pub total_commission: Decimal,
    pub hedge_trades: usize,
    pub orders_submitted: usize,
    pub orders_canceled: usize,
    /// Number of timestamps processed
    pub bars_processed: usize,
    pub equity_curve: Vec<(i64, Decimal)>,
    pub trades: Vec<TradeRecord>,
    peak_equity: Decimal,
    returns: Vec<f64>,
}

impl BacktestStats {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            final_equity: initial_capital,
            peak_equity: initial_capital,
            ..Default::default()
        }
    }

    /// Record equity at a timestamp.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal) {
        if let Some((_, prev_equity)) = self.equity_curve.last() {
            if *prev_equity > Decimal::ZERO {
                let ret = ((equity - *prev_equity) / *prev_equity)
                    .to_f64()
                    .unwrap_or(0.0);
                self.returns.push(ret);
            }
        }

        self.equity_curve.push((timestamp, equity));

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.bars_processed += 1;
    }

    pub fn record_fill(&mut self, fill: &Fill) {
        self.total_commission += fill.commission;
        if matches!(fill.role, OrderRole::Hedge | OrderRole::HedgeExit) {
            self.hedge_trades += 1;
        }
        self.trades.push(TradeRecord::from(fill));
        self.total_trades += 1;
    }

    /// Calculate final statistics.
    pub fn finalize(&mut self, account: &Account) {
        self.final_equity = account.equity;

        if self.initial_capital > Decimal::ZERO {
            self.total_return_pct =
                (self.final_equity - self.initial_capital) / self.initial_capital * dec!(100);
        }

        if !self.equity_curve.is_empty() {
            let days = self.equity_curve.len() as f64;
            let total_return = self.total_return_pct.to_f64().unwrap_or(0.0) / 100.0;
            let annualized = ((1.0 + total_return).powf(252.0 / days) - 1.0) * 100.0;
            self.annualized_return_pct = Decimal::try_from(annualized)
                .map(|d| d.round_dp(4))
                .unwrap_or(Decimal::ZERO);
        }

        let mut total_profit = Decimal::ZERO;
        let mut total_loss = Decimal::ZERO;
        (self.closing_trades, self.winning_trades, self.losing_trades) = (0, 0, 0);
        for pnl in self.trades.iter().filter_map(|t| t.pnl) {
            self.closing_trades += 1;
            if pnl > Decimal::ZERO {
                self.winning_trades += 1;
                total_profit += pnl;
            } else {
                self.losing_trades += 1;
                total_loss += pnl.abs();
            }
        }

        if self.closing_trades > 0 {
            self.win_rate_pct = Decimal::from(self.winning_trades * 100)
                / Decimal::from(self.closing_trades);
        }
        if self.winning_trades > 0 {
            self.avg_win = total_profit / Decimal::from(self.winning_trades);
        }
        if self.losing_trades > 0 {
            self.avg_loss = total_loss / Decimal::from(self.losing_trades);
        }
        if total_loss > Decimal::ZERO {
            self.profit_factor = total_profit / total_loss;
        }

        self.sharpe_ratio = sharpe(&self.returns);
        self.sortino_ratio = sortino(&self.returns);
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sharpe(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean = mean(returns);
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev > 0.0 {
        mean * 252.0_f64.sqrt() / std_dev
    } else {
        0.0
    }
}

/// Like Sharpe, but only downside deviation counts as risk.
fn sortino(returns: &[f64]) -> f64 {
    let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if negative.is_empty() {
        return 0.0;
    }
    let downside = (negative.iter().map(|r| r.powi(2)).sum::<f64>() / negative.len() as f64).sqrt();
    if downside > 0.0 {
        mean(returns) * 252.0_f64.sqrt() / downside
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::OrderId;

    fn fill(role: OrderRole, realized_pnl: Decimal) -> Fill {
        Fill {
            order_id: OrderId::new(),
            symbol: "EURUSD".into(),
            direction: Direction::Short,
            role,
            quantity: dec!(0.5),
            price: dec!(1.1),
            commission: dec!(3.5),
            realized_pnl,
            timestamp: 0,
        }
    }

    #[test]
    fn test_drawdown_tracking() {
        let mut stats = BacktestStats::new(dec!(10000));
        stats.record_equity(1, dec!(11000));
        stats.record_equity(2, dec!(9900));
        stats.record_equity(3, dec!(10500));
        assert_eq!(stats.max_drawdown_pct, dec!(10));
        assert_eq!(stats.bars_processed, 3);
    }

    #[test]
    fn test_trade_statistics() {
        let mut stats = BacktestStats::new(dec!(10000));
        stats.record_fill(&fill(OrderRole::Entry, Decimal::ZERO));
        stats.record_fill(&fill(OrderRole::ProtectiveStop, dec!(-20)));
        stats.record_fill(&fill(OrderRole::Exit, dec!(60)));
        stats.record_fill(&fill(OrderRole::Hedge, Decimal::ZERO));

        let mut account = Account::new(dec!(10000));
        account.equity = dec!(10026);
        stats.finalize(&account);

        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.closing_trades, 2);
        assert_eq!(stats.win_rate_pct, dec!(50));
        assert_eq!(stats.profit_factor, dec!(3));
        assert_eq!(stats.total_commission, dec!(14));
        assert_eq!(stats.hedge_trades, 1);
        assert_eq!(stats.total_return_pct, dec!(0.26));
    }

    #[test]
    fn test_flat_returns_have_no_ratio() {
        assert_eq!(sharpe(&[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(sortino(&[0.01, 0.02]), 0.0);
        assert!(sharpe(&[0.01, -0.005, 0.02]) > 0.0);
    }
}
