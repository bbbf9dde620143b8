//! Domain error types.
//!
//! Insufficient funds and insufficient shares are *not* errors: they are
//! recorded outcomes on an order. The variants here cover configuration,
//! data and routine failures that can abort a run in strict mode.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed snapshot {snapshot_id}: column {column}: {reason}")]
    MalformedSnapshot {
        snapshot_id: String,
        column: String,
        reason: String,
    },

    #[error("decision routine failed for {ticker} on {date}: {reason}")]
    Decision {
        ticker: String,
        date: String,
        reason: String,
    },

    #[error("indicator routine failed for {ticker} on {date}: {reason}")]
    Indicator {
        ticker: String,
        date: String,
        reason: String,
    },

    #[error("order build failed for {ticker} at {price}: {reason}")]
    OrderBuild {
        ticker: String,
        price: f64,
        reason: String,
    },

    #[error("dataset provider failed for {ticker}: {reason}")]
    Provider { ticker: String, reason: String },

    #[error("no datasets available for {ticker}")]
    NoData { ticker: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::Provider { .. } | TradesimError::NoData { .. } => 3,
            TradesimError::MalformedSnapshot { .. } => 4,
            TradesimError::Decision { .. }
            | TradesimError::Indicator { .. }
            | TradesimError::OrderBuild { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
