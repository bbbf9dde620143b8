#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;

use tradesim::domain::config::EngineConfig;
use tradesim::domain::dataset::{DatasetSnapshot, Row, SnapshotData, Table};
use tradesim::domain::error::TradesimError;
use tradesim::domain::signal::Signal;
use tradesim::ports::algo_port::{DecisionRoutine, StepContext};
use tradesim::ports::data_port::DatasetProvider;

pub struct MockProvider {
    pub data: HashMap<String, Vec<DatasetSnapshot>>,
    pub errors: HashMap<String, String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_snapshots(mut self, ticker: &str, snapshots: Vec<DatasetSnapshot>) -> Self {
        self.data.insert(ticker.to_string(), snapshots);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DatasetProvider for MockProvider {
    fn fetch_snapshots(&self, ticker: &str) -> Result<Vec<DatasetSnapshot>, TradesimError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TradesimError::Provider {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradesimError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn coverage(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesimError> {
        match self.data.get(ticker) {
            Some(snapshots) if !snapshots.is_empty() => {
                let min = snapshots.iter().map(|s| s.date).min().unwrap();
                let max = snapshots.iter().map(|s| s.date).max().unwrap();
                Ok(Some((min, max, snapshots.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn daily_row(d: NaiveDate, close: f64) -> Row {
    json!({
        "date": d.format("%Y-%m-%d").to_string(),
        "open": close - 1.0,
        "high": close + 1.0,
        "low": close - 2.0,
        "close": close,
        "volume": 1000,
    })
    .as_object()
    .unwrap()
    .clone()
}

/// One snapshot with a single-row daily table.
pub fn make_snapshot(ticker: &str, d: NaiveDate, close: f64) -> DatasetSnapshot {
    let mut data = SnapshotData::default();
    data.daily.push(daily_row(d, close));
    DatasetSnapshot::new(ticker, d, data)
}

/// One snapshot per close, each daily table accumulating the bars so far:
/// the algorithm-ready shape a real extraction pipeline serves.
pub fn snapshots_from_closes(
    ticker: &str,
    start: NaiveDate,
    closes: &[f64],
) -> Vec<DatasetSnapshot> {
    let mut rows: Vec<Row> = Vec::new();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let d = start + chrono::Duration::days(i as i64);
            rows.push(daily_row(d, close));
            let mut data = SnapshotData::default();
            data.daily = Table::from_rows(rows.clone());
            DatasetSnapshot::new(ticker, d, data)
        })
        .collect()
}

/// Replays a fixed signal sequence, one per step, holding when exhausted.
pub struct Script {
    signals: Vec<Signal>,
    next: usize,
}

impl Script {
    pub fn new(signals: Vec<Signal>) -> Box<Self> {
        Box::new(Script { signals, next: 0 })
    }
}

impl DecisionRoutine for Script {
    fn process(&mut self, _ctx: &StepContext<'_>) -> Result<Signal, TradesimError> {
        let signal = self.signals.get(self.next).cloned().unwrap_or_default();
        self.next += 1;
        Ok(signal)
    }
}

/// Engine config used across the integration suite: single ticker, the
/// default commission, end-of-step exits disabled so positions can persist
/// between steps.
pub fn sample_config(ticker: &str, balance: f64) -> EngineConfig {
    let mut config = EngineConfig::for_ticker(ticker, balance, 6.0);
    config.exit_on_step_end = false;
    config
}
