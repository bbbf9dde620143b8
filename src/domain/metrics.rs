//! Performance summary derived from a finished run.
//!
//! Equity at each history node is cash plus the mark-to-market value of the
//! shares held (at the node's trade price), so drawdown covers steps where
//! capital sits in a position.

use serde::Serialize;

use super::engine::AlgorithmResult;
use super::history::HistoryNode;
use super::order::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub starting_balance: f64,
    pub ending_balance: f64,
    /// Ending equity minus starting balance (open positions marked to the
    /// last trade price).
    pub net_pnl: f64,
    /// Net PnL over starting balance.
    pub total_return: f64,
    /// Largest peak-to-trough equity decline, as a fraction of the peak.
    pub max_drawdown: f64,
    /// Length in nodes of the longest drawdown stretch.
    pub max_drawdown_duration: usize,
    pub num_processed: usize,
    pub buys_filled: usize,
    pub buys_rejected: usize,
    pub sells_filled: usize,
    pub sells_rejected: usize,
}

impl PerformanceSummary {
    pub fn compute(result: &AlgorithmResult, starting_balance: f64) -> Self {
        let equity_curve: Vec<f64> = result.history.iter().map(node_equity).collect();
        let ending_equity = equity_curve.last().copied().unwrap_or(starting_balance);

        let net_pnl = ending_equity - starting_balance;
        let total_return = if starting_balance > 0.0 {
            net_pnl / starting_balance
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&equity_curve);

        let buys_filled = result.buys.iter().filter(|o| o.is_filled()).count();
        let sells_filled = result.sells.iter().filter(|o| o.is_filled()).count();

        PerformanceSummary {
            starting_balance,
            ending_balance: result.balance,
            net_pnl,
            total_return,
            max_drawdown,
            max_drawdown_duration,
            num_processed: result.num_processed,
            buys_filled,
            buys_rejected: result
                .buys
                .iter()
                .filter(|o| o.status == OrderStatus::NotEnoughFunds)
                .count(),
            sells_filled,
            sells_rejected: result
                .sells
                .iter()
                .filter(|o| o.status == OrderStatus::NotEnoughShares)
                .count(),
        }
    }
}

fn node_equity(node: &HistoryNode) -> f64 {
    node.balance + node.shares_owned as f64 * node.trade_price
}

/// Walk the equity curve tracking the running peak; returns the deepest
/// fractional decline and the longest stretch spent below a peak.
fn compute_drawdown(equity_curve: &[f64]) -> (f64, usize) {
    let mut peak = f64::MIN;
    let mut max_drawdown = 0.0_f64;
    let mut max_duration = 0usize;
    let mut current_duration = 0usize;

    for &equity in equity_curve {
        if equity >= peak {
            peak = equity;
            current_duration = 0;
        } else {
            current_duration += 1;
            if current_duration > max_duration {
                max_duration = current_duration;
            }
            if peak > 0.0 {
                let drawdown = (peak - equity) / peak;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }
    }

    (max_drawdown, max_duration)
}
