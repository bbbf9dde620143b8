//! Dataset provider port trait.

use crate::domain::dataset::DatasetSnapshot;
use crate::domain::error::TradesimError;
use chrono::NaiveDate;

/// Supplies per-ticker, per-date dataset snapshots to the engine.
///
/// The engine treats this as a pull source and is agnostic to whether the
/// snapshots come from a cache, an object store, or a local file. Snapshots
/// must be returned in chronological order.
pub trait DatasetProvider {
    fn fetch_snapshots(&self, ticker: &str) -> Result<Vec<DatasetSnapshot>, TradesimError>;

    fn list_tickers(&self) -> Result<Vec<String>, TradesimError>;

    /// First date, last date and snapshot count for a ticker, when known.
    fn coverage(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesimError>;
}
