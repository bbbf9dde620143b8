//! Order simulation: pure buy/sell outcome computation.
//!
//! The builders never touch engine state. They take the pre-trade balance
//! and holdings, decide whether the order fills, and return a fully
//! populated [`OrderRecord`] for every attempt, failures included, so the
//! caller can always record the attempt for audit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// Current order-record schema version.
pub const ORDER_SCHEMA_VERSION: u32 = 1;

/// Floor under the reference price for buys; penny quotes are not tradable.
const MIN_BUY_PRICE: f64 = 0.1;
/// Floor under tradable capital; below this a buy cannot clear round-trip costs.
const MIN_TRADABLE_FUNDS: f64 = 10.0;

/// Round to cents, the fixed precision of all simulated money amounts.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Outcome of an order attempt. Funds/shares shortfalls are expected,
/// frequent outcomes and are recorded rather than raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created but not applied (auto-fill disabled).
    Open,
    Filled,
    NotEnoughFunds,
    NotEnoughShares,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Open => "open",
            OrderStatus::Filled => "filled",
            OrderStatus::NotEnoughFunds => "not-enough-funds",
            OrderStatus::NotEnoughShares => "not-enough-shares",
        };
        write!(f, "{label}")
    }
}

/// Inputs for one order attempt.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub ticker: String,
    /// Shares currently owned for this ticker.
    pub shares_owned: i64,
    /// Price at which the fill is assumed to occur.
    pub reference_price: f64,
    /// Available cash before the trade.
    pub balance: f64,
    pub commission: f64,
    pub trade_date: NaiveDate,
    /// Explicit share count; `None` sizes the order automatically
    /// (max affordable for buys, everything owned for sells).
    pub requested_shares: Option<i64>,
    /// Normal backtest mode. When disabled the order is created but the
    /// share/balance fields keep their pre-trade values.
    pub auto_fill: bool,
    /// Serialized snapshot of the triggering row, for later review.
    pub details: String,
    pub reason: Option<String>,
}

/// One immutable order attempt. Appended to the position's buy/sell list
/// when filled and to the engine's global lists regardless of outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub ticker: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    /// Balance after the order (equal to `prev_balance` unless filled).
    pub balance: f64,
    /// Share count after the order (equal to `prev_shares` unless filled).
    pub shares: i64,
    /// Cost (buys) or proceeds (sells) including commission.
    pub trade_price: Option<f64>,
    pub prev_balance: f64,
    pub prev_shares: i64,
    /// Reference close price the order was evaluated against.
    pub close: f64,
    pub details: String,
    pub reason: Option<String>,
    pub date: NaiveDate,
    /// Set only when the trade was accepted.
    pub created: Option<DateTime<Utc>>,
    pub version: u32,
}

impl OrderRecord {
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}

/// Compute the outcome of a buy intent.
///
/// Sizing reserves two commissions from the balance (one for this buy, one
/// for the eventual exit) before dividing by the reference price. The cost
/// check runs against the full balance because an explicit share request can
/// exceed what the reserve-based sizing would allow.
pub fn build_buy_order(intent: OrderIntent) -> OrderRecord {
    let mut status = OrderStatus::Open;
    let mut trade_price = None;
    let mut new_shares = intent.shares_owned;
    let mut new_balance = intent.balance;
    let mut created = None;

    let tradable_funds = intent.balance - 2.0 * intent.commission;

    if intent.reference_price > MIN_BUY_PRICE && tradable_funds > MIN_TRADABLE_FUNDS {
        let desired = intent
            .requested_shares
            .unwrap_or((tradable_funds / intent.reference_price) as i64);
        let cost = round2(desired as f64 * intent.reference_price + intent.commission);
        if desired > 0 {
            trade_price = Some(cost);
            if cost > intent.balance {
                status = OrderStatus::NotEnoughFunds;
            } else {
                created = Some(Utc::now());
                if intent.auto_fill {
                    new_shares = intent.shares_owned + desired;
                    new_balance = intent.balance - cost;
                    status = OrderStatus::Filled;
                }
            }
        } else {
            status = OrderStatus::NotEnoughFunds;
        }
    } else {
        status = OrderStatus::NotEnoughFunds;
    }

    OrderRecord {
        ticker: intent.ticker,
        side: OrderSide::Buy,
        status,
        balance: new_balance,
        shares: new_shares,
        trade_price,
        prev_balance: intent.balance,
        prev_shares: intent.shares_owned,
        close: intent.reference_price,
        details: intent.details,
        reason: intent.reason,
        date: intent.trade_date,
        created,
        version: ORDER_SCHEMA_VERSION,
    }
}

/// Compute the outcome of a sell intent.
///
/// An explicit share request is clamped to current holdings before proceeds
/// are computed, so a fill can never drive the share count negative.
pub fn build_sell_order(intent: OrderIntent) -> OrderRecord {
    let mut status = OrderStatus::Open;
    let mut trade_price = None;
    let mut new_shares = intent.shares_owned;
    let mut new_balance = intent.balance;
    let mut created = None;

    if intent.shares_owned > 0 {
        let desired = intent
            .requested_shares
            .map(|r| r.clamp(0, intent.shares_owned))
            .unwrap_or(intent.shares_owned);
        if desired > 0 {
            let proceeds =
                round2(desired as f64 * intent.reference_price - intent.commission);
            trade_price = Some(proceeds);
            created = Some(Utc::now());
            if intent.auto_fill {
                new_shares = intent.shares_owned - desired;
                new_balance = intent.balance + proceeds;
                status = OrderStatus::Filled;
            }
        } else {
            status = OrderStatus::NotEnoughShares;
        }
    } else {
        status = OrderStatus::NotEnoughShares;
    }

    OrderRecord {
        ticker: intent.ticker,
        side: OrderSide::Sell,
        status,
        balance: new_balance,
        shares: new_shares,
        trade_price,
        prev_balance: intent.balance,
        prev_shares: intent.shares_owned,
        close: intent.reference_price,
        details: intent.details,
        reason: intent.reason,
        date: intent.trade_date,
        created,
        version: ORDER_SCHEMA_VERSION,
    }
}
