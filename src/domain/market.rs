//! Per-run market state derived from the most recent snapshot rows.

use chrono::NaiveDate;
use serde::Serialize;

use super::dataset::{integer_field, number_field, string_field, DatasetSnapshot, FieldError};
use super::error::TradesimError;

/// Mutable market-state fields owned by the engine, one instance per run.
///
/// `today_*` fields come from the last daily row, `latest_*` from the last
/// minute row, `ask`/`bid` from the last quote row. A missing column or
/// sub-table leaves the corresponding fields at their prior values;
/// `backtest_date` always advances to the snapshot date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketState {
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
    /// Raw timestamp of the last minute row, when the feed carries one.
    pub latest_minute: Option<String>,

    pub ask: f64,
    pub bid: f64,

    pub backtest_date: Option<NaiveDate>,
    /// First non-zero close seen this run; the buy-and-hold baseline.
    pub starting_close: f64,
    /// Most recent close seen; the reference price for simulated orders.
    pub trade_price: f64,
}

impl MarketState {
    pub fn new() -> Self {
        MarketState::default()
    }

    /// Refresh from one snapshot.
    ///
    /// The date advances before any fallible coercion so a malformed row
    /// never stalls the backtest clock. On coercion failure the remaining
    /// field updates for this step are abandoned and the error is returned;
    /// the caller decides whether that aborts the run.
    pub fn refresh(&mut self, snapshot: &DatasetSnapshot) -> Result<(), TradesimError> {
        self.backtest_date = Some(snapshot.date);
        self.latest_minute = None;

        let wrap = |e: FieldError| TradesimError::MalformedSnapshot {
            snapshot_id: snapshot.id.clone(),
            column: e.column,
            reason: e.reason,
        };

        if let Some(row) = snapshot.data.daily.last_row() {
            if let Some(v) = number_field(row, "high").map_err(wrap)? {
                self.today_high = v;
            }
            if let Some(v) = number_field(row, "low").map_err(wrap)? {
                self.today_low = v;
            }
            if let Some(v) = number_field(row, "open").map_err(wrap)? {
                self.today_open = v;
            }
            if let Some(v) = number_field(row, "close").map_err(wrap)? {
                self.today_close = v;
                self.trade_price = v;
                if self.starting_close == 0.0 {
                    self.starting_close = v;
                }
            }
            if let Some(v) = integer_field(row, "volume").map_err(wrap)? {
                self.today_volume = v;
            }
        }

        if let Some(row) = snapshot.data.minute.last_row() {
            self.latest_minute = string_field(row, "date");
            if let Some(v) = number_field(row, "high").map_err(wrap)? {
                self.latest_high = v;
            }
            if let Some(v) = number_field(row, "low").map_err(wrap)? {
                self.latest_low = v;
            }
            if let Some(v) = number_field(row, "open").map_err(wrap)? {
                self.latest_open = v;
            }
            if let Some(v) = number_field(row, "close").map_err(wrap)? {
                self.latest_close = v;
                self.trade_price = v;
                if self.starting_close == 0.0 {
                    self.starting_close = v;
                }
            }
            if let Some(v) = integer_field(row, "volume").map_err(wrap)? {
                self.latest_volume = v;
            }
        }

        if let Some(row) = snapshot.data.quote.last_row() {
            if let Some(v) = number_field(row, "ask").map_err(wrap)? {
                self.ask = v;
            }
            if let Some(v) = number_field(row, "bid").map_err(wrap)? {
                self.bid = v;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Row, SnapshotData, Table};
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_snapshot(d: NaiveDate, close: f64) -> DatasetSnapshot {
        let mut data = SnapshotData::default();
        data.daily.push(row(json!({
            "date": d.format("%Y-%m-%d").to_string(),
            "high": close + 2.0,
            "low": close - 2.0,
            "open": close - 1.0,
            "close": close,
            "volume": 1200
        })));
        DatasetSnapshot::new("SPY", d, data)
    }

    #[test]
    fn refresh_sets_today_fields_from_last_daily_row() {
        let mut state = MarketState::new();
        let mut snapshot = daily_snapshot(date(2018, 11, 2), 270.0);
        // Two rows: only the last one counts.
        snapshot.data.daily.push(row(json!({
            "high": 282.01, "low": 272.01, "open": 277.01,
            "close": 274.02, "volume": 121
        })));

        state.refresh(&snapshot).unwrap();

        assert_eq!(state.today_close, 274.02);
        assert_eq!(state.today_high, 282.01);
        assert_eq!(state.today_volume, 121);
        assert_eq!(state.trade_price, 274.02);
        assert_eq!(state.backtest_date, Some(date(2018, 11, 2)));
    }

    #[test]
    fn starting_close_set_once_on_first_nonzero_close() {
        let mut state = MarketState::new();
        state.refresh(&daily_snapshot(date(2018, 11, 1), 272.02)).unwrap();
        state.refresh(&daily_snapshot(date(2018, 11, 2), 273.02)).unwrap();
        assert_eq!(state.starting_close, 272.02);
        assert_eq!(state.trade_price, 273.02);
    }

    #[test]
    fn empty_daily_table_keeps_prior_values_but_advances_date() {
        let mut state = MarketState::new();
        state.refresh(&daily_snapshot(date(2018, 11, 1), 272.02)).unwrap();

        let empty = DatasetSnapshot::new("SPY", date(2018, 11, 2), SnapshotData::default());
        state.refresh(&empty).unwrap();

        assert_eq!(state.today_close, 272.02);
        assert_eq!(state.today_high, 274.02);
        assert_eq!(state.backtest_date, Some(date(2018, 11, 2)));
    }

    #[test]
    fn missing_columns_keep_prior_values() {
        let mut state = MarketState::new();
        state.refresh(&daily_snapshot(date(2018, 11, 1), 272.02)).unwrap();

        let mut data = SnapshotData::default();
        data.daily.push(row(json!({"close": 280.0})));
        let partial = DatasetSnapshot::new("SPY", date(2018, 11, 2), data);
        state.refresh(&partial).unwrap();

        assert_eq!(state.today_close, 280.0);
        // high/low/open/volume retain the previous step's values
        assert_eq!(state.today_high, 274.02);
        assert_eq!(state.today_open, 271.02);
        assert_eq!(state.today_volume, 1200);
    }

    #[test]
    fn minute_rows_drive_latest_fields_and_trade_price() {
        let mut state = MarketState::new();
        let mut snapshot = daily_snapshot(date(2018, 11, 2), 270.0);
        snapshot.data.minute.push(row(json!({
            "date": "2018-11-02 15:59:00",
            "high": 271.5, "low": 269.5, "open": 270.2,
            "close": 271.0, "volume": 800
        })));

        state.refresh(&snapshot).unwrap();

        assert_eq!(state.latest_close, 271.0);
        assert_eq!(state.latest_minute.as_deref(), Some("2018-11-02 15:59:00"));
        // The minute close supersedes the daily close as the reference price.
        assert_eq!(state.trade_price, 271.0);
        assert_eq!(state.today_close, 270.0);
    }

    #[test]
    fn quote_row_sets_ask_and_bid() {
        let mut state = MarketState::new();
        let mut snapshot = daily_snapshot(date(2018, 11, 2), 270.0);
        snapshot.data.quote.push(row(json!({"ask": 270.10, "bid": 269.90})));

        state.refresh(&snapshot).unwrap();

        assert_eq!(state.ask, 270.10);
        assert_eq!(state.bid, 269.90);
    }

    #[test]
    fn malformed_close_aborts_update_but_date_advanced() {
        let mut state = MarketState::new();
        state.refresh(&daily_snapshot(date(2018, 11, 1), 272.02)).unwrap();

        let mut data = SnapshotData::default();
        data.daily.push(row(json!({"close": "not-a-price"})));
        let bad = DatasetSnapshot::new("SPY", date(2018, 11, 2), data);

        let err = state.refresh(&bad).unwrap_err();
        assert!(matches!(err, TradesimError::MalformedSnapshot { .. }));
        assert_eq!(state.backtest_date, Some(date(2018, 11, 2)));
        assert_eq!(state.today_close, 272.02);
    }
}
