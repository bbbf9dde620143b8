//! Algorithm-ready JSON dataset adapter.
//!
//! Loads a pre-extracted snapshot bundle from a local JSON file shaped as
//! `{ "<TICKER>": [ { "id", "date", "data": { "daily": [...], ... } } ] }`,
//! the serialized form a caching pipeline publishes for offline backtests.

use crate::domain::dataset::DatasetSnapshot;
use crate::domain::error::TradesimError;
use crate::ports::data_port::DatasetProvider;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct JsonDatasetAdapter {
    datasets: HashMap<String, Vec<DatasetSnapshot>>,
}

impl JsonDatasetAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradesimError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_string(&content).map_err(|e| match e {
            TradesimError::Provider { ticker, reason } => TradesimError::Provider {
                ticker,
                reason: format!("{}: {}", path.display(), reason),
            },
            other => other,
        })
    }

    pub fn from_string(content: &str) -> Result<Self, TradesimError> {
        let mut datasets: HashMap<String, Vec<DatasetSnapshot>> =
            serde_json::from_str(content).map_err(|e| TradesimError::Provider {
                ticker: "*".to_string(),
                reason: format!("invalid dataset JSON: {}", e),
            })?;

        // Providers must serve snapshots chronologically.
        for snapshots in datasets.values_mut() {
            snapshots.sort_by_key(|s| s.date);
        }

        Ok(Self { datasets })
    }
}

impl DatasetProvider for JsonDatasetAdapter {
    fn fetch_snapshots(&self, ticker: &str) -> Result<Vec<DatasetSnapshot>, TradesimError> {
        self.datasets
            .get(&ticker.to_uppercase())
            .cloned()
            .ok_or_else(|| TradesimError::NoData {
                ticker: ticker.to_string(),
            })
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradesimError> {
        let mut tickers: Vec<String> = self.datasets.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn coverage(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesimError> {
        Ok(self.datasets.get(&ticker.to_uppercase()).and_then(|s| {
            match (s.first(), s.last()) {
                (Some(first), Some(last)) => Some((first.date, last.date, s.len())),
                _ => None,
            }
        }))
    }
}
