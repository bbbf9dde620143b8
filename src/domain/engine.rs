//! Backtest engine: the strategy runtime.
//!
//! Drives the per-snapshot state machine (load snapshot, refresh market
//! state, run indicators, run the decision routine, apply orders, record
//! history) over every configured ticker, accumulating balance, ledger and
//! trade-history state as it goes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::domain::config::EngineConfig;
use crate::domain::dataset::DatasetSnapshot;
use crate::domain::error::TradesimError;
use crate::domain::history::{HistoryNode, StepSnapshot, TradeHistory};
use crate::domain::ledger::{Position, PositionLedger};
use crate::domain::market::MarketState;
use crate::domain::order::{build_buy_order, build_sell_order, OrderIntent, OrderRecord};
use crate::domain::signal::Signal;
use crate::ports::algo_port::{DecisionRoutine, IndicatorRoutine, StepContext};
use crate::ports::data_port::DatasetProvider;

/// Aggregate of a run's accumulated state, rebuilt on demand.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmResult {
    pub name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub open_positions: HashMap<String, Position>,
    pub buys: Vec<OrderRecord>,
    pub sells: Vec<OrderRecord>,
    pub num_processed: usize,
    pub history: Vec<HistoryNode>,
    pub balance: f64,
    pub commission: f64,
}

/// One algorithm instance: owns its market state, position ledger and
/// history exclusively. To backtest in parallel, run one engine per thread;
/// nothing is shared between instances.
pub struct Engine {
    config: EngineConfig,
    balance: f64,
    market: MarketState,
    ledger: PositionLedger,
    history: TradeHistory,
    /// Every buy attempt of the run, failures included.
    buys: Vec<OrderRecord>,
    /// Every sell attempt of the run, failures included.
    sells: Vec<OrderRecord>,
    decision: Box<dyn DecisionRoutine>,
    indicator: Option<Box<dyn IndicatorRoutine>>,
    created: DateTime<Utc>,
    prev_balance: Option<f64>,
    prev_shares: Option<i64>,
}

impl Engine {
    pub fn new(config: EngineConfig, decision: Box<dyn DecisionRoutine>) -> Self {
        let balance = config.starting_balance;
        Engine {
            config,
            balance,
            market: MarketState::new(),
            ledger: PositionLedger::new(),
            history: TradeHistory::new(),
            buys: Vec::new(),
            sells: Vec::new(),
            decision,
            indicator: None,
            created: Utc::now(),
            prev_balance: None,
            prev_shares: None,
        }
    }

    pub fn with_indicator(mut self, indicator: Box<dyn IndicatorRoutine>) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn history(&self) -> &TradeHistory {
        &self.history
    }

    /// Run the backtest over every configured ticker.
    ///
    /// A provider failure is terminal for that ticker only; the run aborts
    /// when strict errors are enabled or when no ticker produced data at all.
    pub fn run(&mut self, provider: &dyn DatasetProvider) -> Result<(), TradesimError> {
        let tickers = self.config.tickers.clone();
        let mut provider_failure: Option<TradesimError> = None;
        let mut any_processed = false;

        for ticker in &tickers {
            match provider.fetch_snapshots(ticker) {
                Ok(snapshots) => {
                    if snapshots.is_empty() {
                        warn!(ticker = %ticker, "no snapshots available, skipping");
                        continue;
                    }
                    any_processed = true;
                    self.handle_snapshots(ticker, snapshots)?;
                }
                Err(e) => {
                    if self.config.strict_errors {
                        return Err(e);
                    }
                    error!(ticker = %ticker, error = %e, "provider failed, skipping ticker");
                    provider_failure = Some(e);
                }
            }
        }

        match provider_failure {
            Some(e) if !any_processed => Err(e),
            _ => Ok(()),
        }
    }

    /// Process one ticker's chronologically ordered snapshot sequence.
    pub fn handle_snapshots(
        &mut self,
        ticker: &str,
        snapshots: Vec<DatasetSnapshot>,
    ) -> Result<(), TradesimError> {
        let total = snapshots.len();
        for (idx, snapshot) in snapshots.into_iter().enumerate() {
            let algo_id = format!(
                "ticker={} {}",
                ticker,
                progress_label(idx + 1, total)
            );
            self.step(&algo_id, ticker, snapshot)?;
        }
        Ok(())
    }

    /// Process a single snapshot: refresh state, decide, trade, record.
    fn step(
        &mut self,
        algo_id: &str,
        ticker: &str,
        mut snapshot: DatasetSnapshot,
    ) -> Result<(), TradesimError> {
        debug!(algo_id, id = %snapshot.id, date = %snapshot.date, "step start");

        self.prev_balance = Some(self.balance);
        self.prev_shares = Some(self.ledger.shares_owned(ticker));

        if let Err(e) = self.market.refresh(&snapshot) {
            if self.config.strict_errors {
                return Err(e);
            }
            warn!(algo_id, error = %e, "market-state update abandoned, continuing with stale values");
        }

        if let Some(indicator) = self.indicator.as_mut() {
            if let Err(e) = indicator.process(algo_id, ticker, &mut snapshot) {
                if self.config.strict_errors {
                    return Err(TradesimError::Indicator {
                        ticker: ticker.to_string(),
                        date: snapshot.date.to_string(),
                        reason: e.to_string(),
                    });
                }
                warn!(algo_id, error = %e, "indicator routine failed, continuing");
            }
        }

        let ctx = StepContext {
            algo_id,
            ticker,
            snapshot: &snapshot,
            market: &self.market,
            balance: self.balance,
            shares_owned: self.ledger.shares_owned(ticker),
            commission: self.config.commission,
        };
        let signal = match self.decision.process(&ctx) {
            Ok(signal) => signal,
            Err(e) => {
                if self.config.strict_errors {
                    return Err(TradesimError::Decision {
                        ticker: ticker.to_string(),
                        date: snapshot.date.to_string(),
                        reason: e.to_string(),
                    });
                }
                warn!(algo_id, error = %e, "decision routine failed, treating as no new signal");
                Signal::hold()
            }
        };

        // Sells run before buys so freed capital can fund this step's buy.
        let mut sold_this_step = false;
        if signal.should_sell && self.ledger.shares_owned(ticker) > 0 {
            sold_this_step =
                self.create_sell_order(ticker, &snapshot, None, signal.note.clone())?;
        }

        if signal.should_buy {
            self.create_buy_order(ticker, &snapshot, None, signal.note.clone())?;
        }

        // End-of-step exit policy: if shares remain and nothing was sold this
        // step, attempt to close the position before moving on.
        if self.config.exit_on_step_end
            && !sold_this_step
            && self.ledger.shares_owned(ticker) > 0
        {
            self.create_sell_order(
                ticker,
                &snapshot,
                None,
                Some("end-of-step exit".to_string()),
            )?;
        }

        // History is recorded every step, orders or not.
        let node = HistoryNode::capture(&StepSnapshot {
            ticker,
            dataset_id: &snapshot.id,
            market: &self.market,
            signal: &signal,
            balance: self.balance,
            prev_balance: self.prev_balance,
            shares_owned: self.ledger.shares_owned(ticker),
            prev_shares_owned: self.prev_shares,
            commission: self.config.commission,
            total_buys: self.buys.len(),
            total_sells: self.sells.len(),
        });
        self.history.append(node);

        debug!(algo_id, balance = self.balance, "step end");
        Ok(())
    }

    /// Build and apply a buy order at the current reference price. Returns
    /// whether the order filled. The attempt is always appended to the
    /// global buy list; only fills touch the ledger and balance.
    fn create_buy_order(
        &mut self,
        ticker: &str,
        snapshot: &DatasetSnapshot,
        requested_shares: Option<i64>,
        reason: Option<String>,
    ) -> Result<bool, TradesimError> {
        let price = self.market.trade_price;
        let details = match self.order_details(snapshot) {
            Ok(details) => details,
            Err(e) => return self.order_build_failed(ticker, price, e),
        };

        let order = build_buy_order(OrderIntent {
            ticker: ticker.to_string(),
            shares_owned: self.ledger.shares_owned(ticker),
            reference_price: price,
            balance: self.balance,
            commission: self.config.commission,
            trade_date: snapshot.date,
            requested_shares,
            auto_fill: self.config.auto_fill,
            details,
            reason,
        });

        let filled = order.is_filled();
        if filled {
            info!(
                name = %self.config.name,
                ticker,
                price,
                shares = order.shares,
                cost = ?order.trade_price,
                balance = order.balance,
                "buy filled"
            );
            self.balance = order.balance;
        } else {
            info!(
                name = %self.config.name,
                ticker,
                price,
                status = %order.status,
                balance = self.balance,
                "buy not filled"
            );
        }
        self.ledger.apply_order(&order);
        self.buys.push(order);
        Ok(filled)
    }

    /// Sell counterpart of [`Engine::create_buy_order`].
    fn create_sell_order(
        &mut self,
        ticker: &str,
        snapshot: &DatasetSnapshot,
        requested_shares: Option<i64>,
        reason: Option<String>,
    ) -> Result<bool, TradesimError> {
        let price = self.market.trade_price;
        let details = match self.order_details(snapshot) {
            Ok(details) => details,
            Err(e) => return self.order_build_failed(ticker, price, e),
        };

        let order = build_sell_order(OrderIntent {
            ticker: ticker.to_string(),
            shares_owned: self.ledger.shares_owned(ticker),
            reference_price: price,
            balance: self.balance,
            commission: self.config.commission,
            trade_date: snapshot.date,
            requested_shares,
            auto_fill: self.config.auto_fill,
            details,
            reason,
        });

        let filled = order.is_filled();
        if filled {
            info!(
                name = %self.config.name,
                ticker,
                price,
                shares_sold = order.prev_shares - order.shares,
                proceeds = ?order.trade_price,
                balance = order.balance,
                "sell filled"
            );
            self.balance = order.balance;
        } else {
            info!(
                name = %self.config.name,
                ticker,
                price,
                status = %order.status,
                balance = self.balance,
                "sell not filled"
            );
        }
        self.ledger.apply_order(&order);
        self.sells.push(order);
        Ok(filled)
    }

    /// Serialized copy of the triggering row for order audit details: the
    /// last daily row, or a minimal date/close stub when none exists.
    fn order_details(&self, snapshot: &DatasetSnapshot) -> Result<String, serde_json::Error> {
        match snapshot.data.daily.last_row() {
            Some(row) => serde_json::to_string(row),
            None => serde_json::to_string(&json!({
                "date": snapshot.date.format("%Y-%m-%d").to_string(),
                "close": self.market.trade_price,
            })),
        }
    }

    /// Shared failure path for order construction: strict mode aborts with
    /// full context, lenient mode logs and drops the attempt.
    fn order_build_failed(
        &self,
        ticker: &str,
        price: f64,
        e: serde_json::Error,
    ) -> Result<bool, TradesimError> {
        let err = TradesimError::OrderBuild {
            ticker: ticker.to_string(),
            price,
            reason: e.to_string(),
        };
        if self.config.strict_errors {
            return Err(err);
        }
        error!(error = %err, "order build failed, attempt not recorded");
        Ok(false)
    }

    /// Aggregate current state into a result for downstream serialization.
    pub fn result(&self) -> AlgorithmResult {
        AlgorithmResult {
            name: self.config.name.clone(),
            created: self.created,
            updated: Utc::now(),
            open_positions: self.ledger.positions().clone(),
            buys: self.buys.clone(),
            sells: self.sells.clone(),
            num_processed: self.history.len(),
            history: self.history.nodes().to_vec(),
            balance: self.balance,
            commission: self.config.commission,
        }
    }

    /// Clear all accumulated run state so the same engine can replay a
    /// dataset from scratch.
    pub fn reset_for_next_run(&mut self) {
        self.balance = self.config.starting_balance;
        self.market = MarketState::new();
        self.ledger.clear();
        self.history.reset();
        self.buys.clear();
        self.sells.clear();
        self.prev_balance = None;
        self.prev_shares = None;
    }
}

/// Progress label for step logging, e.g. `33.3% 1/3`.
fn progress_label(progress: usize, total: usize) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        progress as f64 / total as f64 * 100.0
    };
    format!("{:.1}% {}/{}", percent, progress, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Row, SnapshotData};
    use crate::domain::order::OrderStatus;
    use chrono::NaiveDate;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 11, d).unwrap()
    }

    fn snapshot(ticker: &str, d: u32, close: f64) -> DatasetSnapshot {
        let mut data = SnapshotData::default();
        data.daily.push(row(json!({
            "date": date(d).format("%Y-%m-%d").to_string(),
            "high": close + 2.0,
            "low": close - 2.0,
            "open": close - 1.0,
            "close": close,
            "volume": 1000
        })));
        DatasetSnapshot::new(ticker, date(d), data)
    }

    /// Replays a fixed signal sequence, one per step.
    struct Script {
        signals: Vec<Signal>,
        next: usize,
    }

    impl Script {
        fn new(signals: Vec<Signal>) -> Box<Self> {
            Box::new(Script { signals, next: 0 })
        }
    }

    impl DecisionRoutine for Script {
        fn process(&mut self, _ctx: &StepContext<'_>) -> Result<Signal, TradesimError> {
            let signal = self
                .signals
                .get(self.next)
                .cloned()
                .unwrap_or_default();
            self.next += 1;
            Ok(signal)
        }
    }

    fn engine_with(signals: Vec<Signal>, balance: f64) -> Engine {
        let mut config = EngineConfig::for_ticker("SPY", balance, 6.0);
        config.exit_on_step_end = false;
        Engine::new(config, Script::new(signals))
    }

    #[test]
    fn buy_signal_fills_and_updates_balance_and_ledger() {
        let mut engine = engine_with(vec![Signal::buy()], 1000.0);
        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap();

        assert!((engine.balance() - 184.0).abs() < f64::EPSILON);
        assert_eq!(engine.ledger().shares_owned("SPY"), 3);
        assert_eq!(engine.history().len(), 1);

        let node = &engine.history().nodes()[0];
        assert_eq!(node.balance, 184.0);
        assert_eq!(node.prev_balance, Some(1000.0));
        assert_eq!(node.shares_owned, 3);
        assert_eq!(node.prev_shares_owned, Some(0));
        assert!(node.buy_triggered);
    }

    #[test]
    fn rejected_buy_is_recorded_but_changes_nothing() {
        let mut engine = engine_with(vec![Signal::buy()], 5.0);
        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap();

        assert_eq!(engine.balance(), 5.0);
        assert!(engine.ledger().is_empty());
        let result = engine.result();
        assert_eq!(result.buys.len(), 1);
        assert_eq!(result.buys[0].status, OrderStatus::NotEnoughFunds);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn sell_attempt_without_holdings_is_skipped_entirely() {
        // should_sell with no position: the engine does not even attempt
        // the order.
        let mut engine = engine_with(vec![Signal::sell()], 1000.0);
        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap();

        assert!(engine.result().sells.is_empty());
        assert_eq!(engine.balance(), 1000.0);
        assert_eq!(engine.history().len(), 1);
        assert!(engine.history().nodes()[0].sell_triggered);
    }

    #[test]
    fn round_trip_buy_then_sell() {
        let mut engine = engine_with(vec![Signal::buy(), Signal::sell()], 1000.0);
        engine
            .handle_snapshots(
                "SPY",
                vec![snapshot("SPY", 2, 270.0), snapshot("SPY", 5, 280.0)],
            )
            .unwrap();

        // buy: 3 shares at 270, cost 816 -> balance 184
        // sell: 3 shares at 280, proceeds 834 -> balance 1018
        assert!((engine.balance() - 1018.0).abs() < 1e-9);
        assert_eq!(engine.ledger().shares_owned("SPY"), 0);

        let result = engine.result();
        assert_eq!(result.buys.len(), 1);
        assert_eq!(result.sells.len(), 1);
        assert!(result.sells[0].is_filled());
        assert_eq!(result.num_processed, 2);
    }

    #[test]
    fn sells_run_before_buys_so_freed_capital_funds_the_buy() {
        // Step 1 buys 3 @ 270 (balance 184). Step 2 signals sell+buy at 280:
        // the sell frees 834 first (balance 1018), so the buy can size
        // against 1006 tradable -> 3 shares, cost 846.
        let both = Signal {
            should_buy: true,
            should_sell: true,
            ..Signal::default()
        };
        let mut engine = engine_with(vec![Signal::buy(), both], 1000.0);
        engine
            .handle_snapshots(
                "SPY",
                vec![snapshot("SPY", 2, 270.0), snapshot("SPY", 5, 280.0)],
            )
            .unwrap();

        let result = engine.result();
        assert_eq!(result.sells.len(), 1);
        assert_eq!(result.buys.len(), 2);
        let second_buy = &result.buys[1];
        assert!(second_buy.is_filled());
        assert_eq!(second_buy.prev_balance, 1018.0);
        assert_eq!(second_buy.shares, 3);
    }

    #[test]
    fn end_of_step_exit_closes_position_without_sell_signal() {
        let mut config = EngineConfig::for_ticker("SPY", 1000.0, 6.0);
        config.exit_on_step_end = true;
        let mut engine = Engine::new(config, Script::new(vec![Signal::buy()]));

        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap();

        // The buy filled, then the mandatory exit sold all shares back.
        assert_eq!(engine.ledger().shares_owned("SPY"), 0);
        let result = engine.result();
        assert_eq!(result.buys.len(), 1);
        assert_eq!(result.sells.len(), 1);
        assert_eq!(
            result.sells[0].reason.as_deref(),
            Some("end-of-step exit")
        );
        // 1000 - 816 + (3 * 270 - 6) = 988
        assert!((engine.balance() - 988.0).abs() < 1e-9);
    }

    #[test]
    fn end_of_step_exit_never_leaves_shares_held() {
        let mut config = EngineConfig::for_ticker("SPY", 1000.0, 6.0);
        config.exit_on_step_end = true;
        let mut engine = Engine::new(
            config,
            Script::new(vec![Signal::buy(), Signal::sell()]),
        );

        engine
            .handle_snapshots(
                "SPY",
                vec![snapshot("SPY", 2, 270.0), snapshot("SPY", 5, 280.0)],
            )
            .unwrap();

        let result = engine.result();
        // Step 1: buy, then the forced exit closes it in the same step.
        // Step 2: nothing owned, so the sell signal attempts no order and
        // the exit check has nothing to do.
        assert_eq!(result.buys.len(), 1);
        assert_eq!(result.sells.len(), 1);
        for node in &result.history {
            assert_eq!(node.shares_owned, 0);
        }
    }

    #[test]
    fn decision_failure_in_lenient_mode_holds_and_continues() {
        struct Failing;
        impl DecisionRoutine for Failing {
            fn process(&mut self, _ctx: &StepContext<'_>) -> Result<Signal, TradesimError> {
                Err(TradesimError::Decision {
                    ticker: "SPY".into(),
                    date: "2018-11-02".into(),
                    reason: "boom".into(),
                })
            }
        }

        let config = EngineConfig::for_ticker("SPY", 1000.0, 6.0);
        let mut engine = Engine::new(config, Box::new(Failing));
        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap();

        assert_eq!(engine.balance(), 1000.0);
        assert_eq!(engine.history().len(), 1);
        assert!(!engine.history().nodes()[0].buy_triggered);
    }

    #[test]
    fn decision_failure_in_strict_mode_aborts_with_context() {
        struct Failing;
        impl DecisionRoutine for Failing {
            fn process(&mut self, _ctx: &StepContext<'_>) -> Result<Signal, TradesimError> {
                Err(TradesimError::Decision {
                    ticker: "SPY".into(),
                    date: "2018-11-02".into(),
                    reason: "boom".into(),
                })
            }
        }

        let mut config = EngineConfig::for_ticker("SPY", 1000.0, 6.0);
        config.strict_errors = true;
        let mut engine = Engine::new(config, Box::new(Failing));
        let err = engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap_err();

        match err {
            TradesimError::Decision { ticker, date, .. } => {
                assert_eq!(ticker, "SPY");
                assert_eq!(date, "2018-11-02");
            }
            other => panic!("expected decision error, got {other}"),
        }
        // Nothing recorded for the aborted step.
        assert!(engine.history().is_empty());
    }

    #[test]
    fn malformed_snapshot_in_lenient_mode_keeps_stale_prices() {
        let mut engine = engine_with(vec![Signal::hold(), Signal::hold()], 1000.0);

        let mut bad_data = SnapshotData::default();
        bad_data.daily.push(row(json!({"close": "garbage"})));
        let bad = DatasetSnapshot::new("SPY", date(5), bad_data);

        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0), bad])
            .unwrap();

        let nodes = engine.history().nodes();
        assert_eq!(nodes.len(), 2);
        // stale close, advanced date
        assert_eq!(nodes[1].today_close, 270.0);
        assert_eq!(nodes[1].date, Some(date(5)));
    }

    #[test]
    fn malformed_snapshot_in_strict_mode_aborts() {
        let mut config = EngineConfig::for_ticker("SPY", 1000.0, 6.0);
        config.strict_errors = true;
        let mut engine = Engine::new(config, Script::new(vec![]));

        let mut bad_data = SnapshotData::default();
        bad_data.daily.push(row(json!({"close": "garbage"})));
        let bad = DatasetSnapshot::new("SPY", date(2), bad_data);

        let err = engine.handle_snapshots("SPY", vec![bad]).unwrap_err();
        assert!(matches!(err, TradesimError::MalformedSnapshot { .. }));
    }

    #[test]
    fn indicator_runs_before_decision_and_may_annotate() {
        struct Tagger;
        impl IndicatorRoutine for Tagger {
            fn process(
                &mut self,
                _algo_id: &str,
                _ticker: &str,
                snapshot: &mut DatasetSnapshot,
            ) -> Result<(), TradesimError> {
                let mut r = Row::new();
                r.insert("sma".into(), json!(269.5));
                snapshot.data.stats.push(r);
                Ok(())
            }
        }

        struct BuyIfTagged;
        impl DecisionRoutine for BuyIfTagged {
            fn process(&mut self, ctx: &StepContext<'_>) -> Result<Signal, TradesimError> {
                Ok(if ctx.snapshot.data.stats.last_row().is_some() {
                    Signal::buy()
                } else {
                    Signal::hold()
                })
            }
        }

        let mut config = EngineConfig::for_ticker("SPY", 1000.0, 6.0);
        config.exit_on_step_end = false;
        let mut engine =
            Engine::new(config, Box::new(BuyIfTagged)).with_indicator(Box::new(Tagger));
        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap();

        assert_eq!(engine.ledger().shares_owned("SPY"), 3);
    }

    #[test]
    fn result_aggregates_current_state() {
        let mut engine = engine_with(vec![Signal::buy()], 1000.0);
        engine
            .handle_snapshots("SPY", vec![snapshot("SPY", 2, 270.0)])
            .unwrap();

        let result = engine.result();
        assert_eq!(result.name, "myalgo");
        assert_eq!(result.num_processed, 1);
        assert_eq!(result.history.len(), 1);
        assert_eq!(result.balance, engine.balance());
        assert_eq!(result.commission, 6.0);
        assert_eq!(result.open_positions["SPY"].shares, 3);
    }

    #[test]
    fn reset_then_replay_is_deterministic() {
        let snapshots = vec![
            snapshot("SPY", 1, 265.0),
            snapshot("SPY", 2, 270.0),
            snapshot("SPY", 5, 280.0),
        ];
        let signals = vec![Signal::hold(), Signal::buy(), Signal::sell()];

        let mut engine = engine_with(signals.clone(), 1000.0);
        engine.handle_snapshots("SPY", snapshots.clone()).unwrap();
        let first_history = engine.history().nodes().to_vec();
        let first_balance = engine.balance();

        engine.reset_for_next_run();
        assert!(engine.history().is_empty());
        assert_eq!(engine.balance(), 1000.0);

        // The scripted routine must restart too; swap in a fresh one by
        // rebuilding the engine to mirror a brand-new run.
        let mut replay = engine_with(signals, 1000.0);
        replay.handle_snapshots("SPY", snapshots).unwrap();

        assert_eq!(replay.history().nodes(), first_history.as_slice());
        assert_eq!(replay.balance(), first_balance);
    }

    #[test]
    fn progress_label_formats_percent_done() {
        assert_eq!(progress_label(1, 3), "33.3% 1/3");
        assert_eq!(progress_label(3, 3), "100.0% 3/3");
        assert_eq!(progress_label(0, 0), "0.0% 0/0");
    }
}
