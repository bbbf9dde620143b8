//! CSV daily-bar dataset adapter.
//!
//! Reads `<TICKER>.csv` files of `date,open,high,low,close,volume` rows and
//! serves one snapshot per trading day whose daily sub-table holds every bar
//! up to and including that day, the shape decision routines expect from an
//! algorithm-ready dataset.

use crate::domain::dataset::{DatasetSnapshot, Row, SnapshotData, Table};
use crate::domain::error::TradesimError;
use crate::ports::data_port::DatasetProvider;
use chrono::NaiveDate;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

pub struct CsvDatasetAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Clone)]
struct DailyBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

impl CsvDatasetAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }

    fn read_bars(&self, ticker: &str) -> Result<Vec<DailyBar>, TradesimError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| TradesimError::Provider {
            ticker: ticker.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TradesimError::Provider {
                ticker: ticker.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| TradesimError::Provider {
                ticker: ticker.to_string(),
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TradesimError::Provider {
                    ticker: ticker.to_string(),
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let open = parse_price(&record, 1, "open", ticker)?;
            let high = parse_price(&record, 2, "high", ticker)?;
            let low = parse_price(&record, 3, "low", ticker)?;
            let close = parse_price(&record, 4, "close", ticker)?;

            let volume: i64 = record
                .get(5)
                .ok_or_else(|| TradesimError::Provider {
                    ticker: ticker.to_string(),
                    reason: "missing volume column".into(),
                })?
                .parse()
                .map_err(|e| TradesimError::Provider {
                    ticker: ticker.to_string(),
                    reason: format!("invalid volume value: {}", e),
                })?;

            bars.push(DailyBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_price(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    ticker: &str,
) -> Result<f64, TradesimError> {
    record
        .get(idx)
        .ok_or_else(|| TradesimError::Provider {
            ticker: ticker.to_string(),
            reason: format!("missing {} column", name),
        })?
        .parse()
        .map_err(|e| TradesimError::Provider {
            ticker: ticker.to_string(),
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn bar_row(bar: &DailyBar) -> Row {
    json!({
        "date": bar.date.format("%Y-%m-%d").to_string(),
        "open": bar.open,
        "high": bar.high,
        "low": bar.low,
        "close": bar.close,
        "volume": bar.volume,
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

impl DatasetProvider for CsvDatasetAdapter {
    fn fetch_snapshots(&self, ticker: &str) -> Result<Vec<DatasetSnapshot>, TradesimError> {
        let ticker = ticker.to_uppercase();
        let bars = self.read_bars(&ticker)?;

        let mut snapshots = Vec::with_capacity(bars.len());
        let mut rows: Vec<Row> = Vec::with_capacity(bars.len());
        for bar in &bars {
            rows.push(bar_row(bar));
            let mut data = SnapshotData::default();
            data.daily = Table::from_rows(rows.clone());
            snapshots.push(DatasetSnapshot::new(&ticker, bar.date, data));
        }
        Ok(snapshots)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradesimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TradesimError::Provider {
            ticker: "*".to_string(),
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TradesimError::Provider {
                ticker: "*".to_string(),
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".csv") {
                tickers.push(stem.to_uppercase());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn coverage(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesimError> {
        if !self.csv_path(ticker).exists() {
            return Ok(None);
        }
        let bars = self.read_bars(ticker)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
