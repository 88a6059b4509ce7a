//! Performance metrics reduced from the trade log.
//!
//! The Sharpe ratio here is per trade: mean realized PnL divided by the
//! population standard deviation of realized PnL. It is not annualized.

use std::collections::BTreeMap;

use super::position::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub total_profit: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub final_balance: f64,
    pub total_trades: usize,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[TradeRecord], initial_capital: f64, final_balance: f64) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();

        let win_rate = if pnls.is_empty() {
            0.0
        } else {
            trades.iter().filter(|t| t.is_win()).count() as f64 / pnls.len() as f64
        };

        PerformanceMetrics {
            total_profit: final_balance - initial_capital,
            win_rate,
            sharpe_ratio: per_trade_sharpe(&pnls),
            final_balance,
            total_trades: trades.len(),
        }
    }

    /// The four headline metrics keyed by name.
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_profit", self.total_profit),
            ("win_rate", self.win_rate),
            ("sharpe_ratio", self.sharpe_ratio),
            ("final_balance", self.final_balance),
        ])
    }
}

/// Mean over population stddev; 0 for fewer than two trades or zero spread.
fn per_trade_sharpe(pnls: &[f64]) -> f64 {
    if pnls.len() < 2 {
        return 0.0;
    }

    let n = pnls.len() as f64;
    let mean = pnls.iter().sum::<f64>() / n;
    let variance = pnls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 { mean / stddev } else { 0.0 }
}
