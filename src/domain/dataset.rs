//! Dataset snapshots: one dated bundle of market sub-tables for a ticker.
//!
//! Sub-tables are loosely shaped: different providers ship different column
//! sets, so rows are JSON objects rather than fixed structs. A missing
//! sub-table is always the explicit empty sentinel, never an Option.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single row of a sub-table: named numeric/string fields.
pub type Row = serde_json::Map<String, Value>;

/// Field-level coercion failure, raised to a full error by the caller once
/// the snapshot id is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub column: String,
    pub reason: String,
}

/// An ordered sequence of rows, or the empty sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// The explicit empty-table sentinel.
    pub fn empty() -> Self {
        Table { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Table { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// The most recent row, which carries the step's reference values.
    pub fn last_row(&self) -> Option<&Row> {
        self.rows.last()
    }
}

/// Coerce a named field of a row to `f64`.
///
/// Absent or null fields are `Ok(None)`; the caller keeps its prior value.
/// Numbers pass through; numeric strings are parsed, matching the loosely
/// typed feeds this engine ingests. Anything else is a `FieldError`.
pub fn number_field(row: &Row, column: &str) -> Result<Option<f64>, FieldError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| FieldError {
            column: column.to_string(),
            reason: format!("{n} does not fit in an f64"),
        }),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| FieldError {
            column: column.to_string(),
            reason: format!("expected a number, got {s:?}"),
        }),
        Some(other) => Err(FieldError {
            column: column.to_string(),
            reason: format!("expected a number, got {other}"),
        }),
    }
}

/// Coerce a named field of a row to `i64`, truncating fractional values the
/// way volume feeds sometimes require.
pub fn integer_field(row: &Row, column: &str) -> Result<Option<i64>, FieldError> {
    Ok(number_field(row, column)?.map(|v| v as i64))
}

/// Read a named field of a row as a string, if present.
pub fn string_field(row: &Row, column: &str) -> Option<String> {
    match row.get(column) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// The named sub-tables of one snapshot. Every field defaults to the empty
/// sentinel so partially populated datasets deserialize cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotData {
    pub daily: Table,
    pub minute: Table,
    pub quote: Table,
    pub calls: Table,
    pub puts: Table,
    pub pricing: Table,
    pub news: Table,
    pub financials: Table,
    pub earnings: Table,
    pub dividends: Table,
    pub company: Table,
    pub stats: Table,
    pub peers: Table,
}

/// One point-in-time bundle for a ticker. Produced by a dataset provider,
/// consumed for exactly one processing step, then superseded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub id: String,
    pub date: NaiveDate,
    pub data: SnapshotData,
}

impl DatasetSnapshot {
    /// Canonical snapshot id: `<TICKER>_<DATE>`.
    pub fn make_id(ticker: &str, date: NaiveDate) -> String {
        format!("{}_{}", ticker, date.format("%Y-%m-%d"))
    }

    pub fn new(ticker: &str, date: NaiveDate, data: SnapshotData) -> Self {
        DatasetSnapshot {
            id: Self::make_id(ticker, date),
            date,
            data,
        }
    }
}
