//! Engine configuration: an allow-listed, validated settings struct.
//!
//! External config can only set the fields named here; nothing is reflected
//! into live engine state. Validation happens at load time so a bad value
//! fails the run before any snapshot is processed.

use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "algorithm";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Log-tracking name for the run.
    pub name: String,
    /// Uppercase ticker symbols to process, in order.
    pub tickers: Vec<String>,
    pub starting_balance: f64,
    /// Cost of a single buy or sell trade.
    pub commission: f64,
    /// Assume simulated orders fill; disabling leaves orders open.
    pub auto_fill: bool,
    /// Abort the run on the first routine/data failure instead of logging
    /// and continuing.
    pub strict_errors: bool,
    /// Sell remaining shares at the end of any step that did not already
    /// create a sell, so no step finishes holding an unexamined position.
    /// Disable for strategies that hold across steps.
    pub exit_on_step_end: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: "myalgo".to_string(),
            tickers: Vec::new(),
            starting_balance: 5000.0,
            commission: 6.0,
            auto_fill: true,
            strict_errors: false,
            exit_on_step_end: true,
        }
    }
}

impl EngineConfig {
    /// Single-ticker convenience constructor, mostly for tests and demos.
    pub fn for_ticker(ticker: &str, starting_balance: f64, commission: f64) -> Self {
        EngineConfig {
            tickers: vec![ticker.to_uppercase()],
            starting_balance,
            commission,
            ..EngineConfig::default()
        }
    }

    /// Load and validate from the `[algorithm]` section of a config source.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesimError> {
        let defaults = EngineConfig::default();

        let tickers_str = config
            .get_string(SECTION, "tickers")
            .or_else(|| config.get_string(SECTION, "ticker"))
            .ok_or_else(|| TradesimError::ConfigMissing {
                section: SECTION.to_string(),
                key: "tickers".to_string(),
            })?;
        let tickers = parse_tickers(&tickers_str);
        if tickers.is_empty() {
            return Err(TradesimError::ConfigInvalid {
                section: SECTION.to_string(),
                key: "tickers".to_string(),
                reason: "at least one ticker symbol is required".to_string(),
            });
        }

        let starting_balance =
            config.get_double(SECTION, "balance", defaults.starting_balance);
        if starting_balance <= 0.0 {
            return Err(TradesimError::ConfigInvalid {
                section: SECTION.to_string(),
                key: "balance".to_string(),
                reason: "balance must be positive".to_string(),
            });
        }

        let commission = config.get_double(SECTION, "commission", defaults.commission);
        if commission < 0.0 {
            return Err(TradesimError::ConfigInvalid {
                section: SECTION.to_string(),
                key: "commission".to_string(),
                reason: "commission must be non-negative".to_string(),
            });
        }

        Ok(EngineConfig {
            name: config
                .get_string(SECTION, "name")
                .unwrap_or(defaults.name),
            tickers,
            starting_balance,
            commission,
            auto_fill: config.get_bool(SECTION, "auto_fill", defaults.auto_fill),
            strict_errors: config.get_bool(SECTION, "strict", defaults.strict_errors),
            exit_on_step_end: config.get_bool(
                SECTION,
                "exit_on_step_end",
                defaults.exit_on_step_end,
            ),
        })
    }
}

/// Split a comma-separated ticker list, trimming and uppercasing entries.
pub fn parse_tickers(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
