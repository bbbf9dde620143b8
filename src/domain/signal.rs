//! Trade signal produced by a decision routine for one snapshot step.

use serde::Serialize;

/// What the decision routine wants the engine to do this step.
///
/// Buys will not fill without sufficient funds and sells will not fill
/// without owned shares; the signal only expresses intent. Strength and
/// risk scores are free-form diagnostics carried into the trade history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Signal {
    pub should_buy: bool,
    pub should_sell: bool,
    pub buy_strength: Option<f64>,
    pub buy_risk: Option<f64>,
    pub sell_strength: Option<f64>,
    pub sell_risk: Option<f64>,
    /// Optional annotation recorded on orders and history nodes.
    pub note: Option<String>,
}

impl Signal {
    /// No new signal: take no action this step.
    pub fn hold() -> Self {
        Signal::default()
    }

    pub fn buy() -> Self {
        Signal {
            should_buy: true,
            ..Signal::default()
        }
    }

    pub fn sell() -> Self {
        Signal {
            should_sell: true,
            ..Signal::default()
        }
    }
}
