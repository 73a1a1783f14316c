//! Backtest report generation.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use trading_core::types::Account;

use crate::{BacktestConfig, BacktestStats};

const RULE: &str = "───────────────────────────────────────────────────────────\n";
const BANNER: &str = "═══════════════════════════════════════════════════════════\n";

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub config: BacktestConfig,
    pub stats: BacktestStats,
    /// Account at the end of the run, open positions and resting orders included
    pub final_account: Account,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let stats = &self.stats;
        let mut s = String::new();

        s.push_str(BANNER);
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str(BANNER);
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Initial Capital:     ${:.2}", stats.initial_capital);
        let _ = writeln!(s, "  Final Equity:        ${:.2}", stats.final_equity);
        let _ = writeln!(s, "  Total Return:        {:.2}%", stats.total_return_pct);
        let _ = writeln!(s, "  Annualized Return:   {:.2}%", stats.annualized_return_pct);
        let _ = writeln!(s, "  Max Drawdown:        {:.2}%", stats.max_drawdown_pct);
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Sharpe Ratio:        {:.2}", stats.sharpe_ratio);
        let _ = writeln!(s, "  Sortino Ratio:       {:.2}", stats.sortino_ratio);
        let _ = writeln!(s, "  Profit Factor:       {:.2}", stats.profit_factor);
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Fills:               {}", stats.total_trades);
        let _ = writeln!(s, "  Closing Fills:       {}", stats.closing_trades);
        let _ = writeln!(s, "  Winning:             {}", stats.winning_trades);
        let _ = writeln!(s, "  Losing:              {}", stats.losing_trades);
        let _ = writeln!(s, "  Win Rate:            {:.2}%", stats.win_rate_pct);
        let _ = writeln!(s, "  Avg Win:             ${:.2}", stats.avg_win);
        let _ = writeln!(s, "  Avg Loss:            ${:.2}", stats.avg_loss);
        let _ = writeln!(s, "  Hedge Fills:         {}", stats.hedge_trades);
        let _ = writeln!(s, "  Commission:          ${:.2}", stats.total_commission);
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Bars Processed:      {}", stats.bars_processed);
        let _ = writeln!(s, "  Orders Submitted:    {}", stats.orders_submitted);
        let _ = writeln!(s, "  Orders Canceled:     {}", stats.orders_canceled);
        let _ = writeln!(s, "  Open Positions:      {}", self.final_account.position_count());
        let _ = writeln!(s, "  Resting Orders:      {}", self.final_account.pending_orders.len());
        s.push('\n');

        s.push_str(BANNER);
        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the equity curve as CSV.
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for (ts, equity) in &self.stats.equity_curve {
            let _ = writeln!(csv, "{ts},{equity}");
        }
        csv
    }
}
