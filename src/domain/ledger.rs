//! Per-ticker position ledger.
//!
//! Holdings change only through confirmed order outcomes: a non-filled
//! order is recorded in the engine's audit lists but never touches the
//! ledger. After any applied sequence, shares for a ticker equal the net
//! filled buy flow minus the net filled sell flow and stay non-negative.

use serde::Serialize;
use std::collections::HashMap;

use super::order::{OrderRecord, OrderSide};

/// Holdings and order history for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Position {
    pub ticker: String,
    pub shares: i64,
    pub buys: Vec<OrderRecord>,
    pub sells: Vec<OrderRecord>,
}

impl Position {
    pub fn new(ticker: &str) -> Self {
        Position {
            ticker: ticker.to_string(),
            shares: 0,
            buys: Vec::new(),
            sells: Vec::new(),
        }
    }
}

/// All positions for a run, keyed by ticker symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        PositionLedger::default()
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn has_position(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    /// Shares currently owned; zero for tickers with no recorded activity.
    pub fn shares_owned(&self, ticker: &str) -> i64 {
        self.positions.get(ticker).map_or(0, |p| p.shares)
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Commit a filled order: upsert the position with the share delta the
    /// order reports and append it to the matching buy/sell list. Orders in
    /// any other status leave the ledger untouched.
    pub fn apply_order(&mut self, order: &OrderRecord) {
        if !order.is_filled() {
            return;
        }

        let delta = order.shares - order.prev_shares;
        let position = self
            .positions
            .entry(order.ticker.clone())
            .or_insert_with(|| Position::new(&order.ticker));
        position.shares += delta;

        match order.side {
            OrderSide::Buy => position.buys.push(order.clone()),
            OrderSide::Sell => position.sells.push(order.clone()),
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}
