//! Trade history: append-only audit trail of full algorithm state.
//!
//! One node is captured after every processed snapshot, whether or not an
//! order was created. Nodes are value copies: they never alias the live
//! market state, which keeps mutating on subsequent steps.

use chrono::NaiveDate;
use serde::Serialize;

use super::market::MarketState;
use super::signal::Signal;

/// Current history-node schema version.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

/// One immutable record of algorithm state after processing one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryNode {
    pub ticker: String,
    /// Id of the snapshot this node was captured for.
    pub dataset_id: String,
    pub date: Option<NaiveDate>,

    pub balance: f64,
    pub prev_balance: Option<f64>,
    pub shares_owned: i64,
    pub prev_shares_owned: Option<i64>,
    pub commission: f64,

    pub starting_close: f64,
    pub trade_price: f64,

    pub today_high: f64,
    pub today_low: f64,
    pub today_open: f64,
    pub today_close: f64,
    pub today_volume: i64,

    pub latest_high: f64,
    pub latest_low: f64,
    pub latest_open: f64,
    pub latest_close: f64,
    pub latest_volume: i64,

    pub ask: f64,
    pub bid: f64,

    /// Running order-attempt counts at capture time.
    pub total_buys: usize,
    pub total_sells: usize,

    pub buy_triggered: bool,
    pub buy_strength: Option<f64>,
    pub buy_risk: Option<f64>,
    pub sell_triggered: bool,
    pub sell_strength: Option<f64>,
    pub sell_risk: Option<f64>,

    pub note: Option<String>,
    pub version: u32,
}

/// Everything a history node needs from the current step, by value or
/// read-only reference.
#[derive(Debug)]
pub struct StepSnapshot<'a> {
    pub ticker: &'a str,
    pub dataset_id: &'a str,
    pub market: &'a MarketState,
    pub signal: &'a Signal,
    pub balance: f64,
    pub prev_balance: Option<f64>,
    pub shares_owned: i64,
    pub prev_shares_owned: Option<i64>,
    pub commission: f64,
    pub total_buys: usize,
    pub total_sells: usize,
}

impl HistoryNode {
    /// Capture one flat value-copied record of the current step.
    pub fn capture(step: &StepSnapshot<'_>) -> Self {
        let market = step.market;
        let signal = step.signal;
        HistoryNode {
            ticker: step.ticker.to_string(),
            dataset_id: step.dataset_id.to_string(),
            date: market.backtest_date,
            balance: step.balance,
            prev_balance: step.prev_balance,
            shares_owned: step.shares_owned,
            prev_shares_owned: step.prev_shares_owned,
            commission: step.commission,
            starting_close: market.starting_close,
            trade_price: market.trade_price,
            today_high: market.today_high,
            today_low: market.today_low,
            today_open: market.today_open,
            today_close: market.today_close,
            today_volume: market.today_volume,
            latest_high: market.latest_high,
            latest_low: market.latest_low,
            latest_open: market.latest_open,
            latest_close: market.latest_close,
            latest_volume: market.latest_volume,
            ask: market.ask,
            bid: market.bid,
            total_buys: step.total_buys,
            total_sells: step.total_sells,
            buy_triggered: signal.should_buy,
            buy_strength: signal.buy_strength,
            buy_risk: signal.buy_risk,
            sell_triggered: signal.should_sell,
            sell_strength: signal.sell_strength,
            sell_risk: signal.sell_risk,
            note: signal.note.clone(),
            version: HISTORY_SCHEMA_VERSION,
        }
    }
}

/// The ordered, append-only history sequence for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeHistory {
    nodes: Vec<HistoryNode>,
}

impl TradeHistory {
    pub fn new() -> Self {
        TradeHistory::default()
    }

    pub fn append(&mut self, node: HistoryNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[HistoryNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Start-of-run reset: the only operation that removes nodes.
    pub fn reset(&mut self) {
        self.nodes.clear();
    }
}
