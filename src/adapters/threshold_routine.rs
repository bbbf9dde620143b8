//! Built-in close-price threshold decision routine.
//!
//! Buys when the reference close drops to or below `buy_below`, sells when
//! it rises to or above `sell_above`. Deliberately simple: the point of the
//! engine is the pluggable [`DecisionRoutine`] seam, and this adapter gives
//! the CLI a working default configured from the `[strategy]` section.

use crate::domain::error::TradesimError;
use crate::domain::signal::Signal;
use crate::ports::algo_port::{DecisionRoutine, StepContext};
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Default)]
pub struct ThresholdRoutine {
    pub buy_below: Option<f64>,
    pub sell_above: Option<f64>,
}

impl ThresholdRoutine {
    pub fn new(buy_below: Option<f64>, sell_above: Option<f64>) -> Self {
        ThresholdRoutine {
            buy_below,
            sell_above,
        }
    }

    /// Read thresholds from the `[strategy]` section; either may be absent.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let threshold = |key: &str| {
            let value = config.get_double("strategy", key, f64::NAN);
            if value.is_nan() { None } else { Some(value) }
        };
        ThresholdRoutine {
            buy_below: threshold("buy_below"),
            sell_above: threshold("sell_above"),
        }
    }
}

impl DecisionRoutine for ThresholdRoutine {
    fn process(&mut self, ctx: &StepContext<'_>) -> Result<Signal, TradesimError> {
        let close = ctx.market.trade_price;
        let mut signal = Signal::hold();

        if let Some(limit) = self.sell_above {
            if ctx.shares_owned > 0 && close >= limit {
                signal.should_sell = true;
                signal.sell_strength = Some(close - limit);
            }
        }
        if let Some(limit) = self.buy_below {
            if close > 0.0 && close <= limit {
                signal.should_buy = true;
                signal.buy_strength = Some(limit - close);
            }
        }

        Ok(signal)
    }
}
