//! Decision and indicator routine port traits.
//!
//! These are the user-extensible seams of the engine. A decision routine
//! reads the step context and answers with a [`Signal`]; it never mutates
//! engine state directly, which keeps routines order-independent and
//! testable in isolation.

use crate::domain::dataset::DatasetSnapshot;
use crate::domain::error::TradesimError;
use crate::domain::market::MarketState;
use crate::domain::signal::Signal;

/// Read-only view of the engine's state for one snapshot step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Progress label for this step, e.g. `ticker=SPY 33.3% 1/3`.
    pub algo_id: &'a str,
    pub ticker: &'a str,
    pub snapshot: &'a DatasetSnapshot,
    pub market: &'a MarketState,
    /// Cash available before any order this step.
    pub balance: f64,
    /// Shares owned for this ticker before any order this step.
    pub shares_owned: i64,
    pub commission: f64,
}

/// The pluggable buy/sell decision step, invoked once per snapshot.
pub trait DecisionRoutine {
    fn process(&mut self, ctx: &StepContext<'_>) -> Result<Signal, TradesimError>;
}

/// Optional pre-decision step that may annotate the snapshot with derived
/// values (for example indicator columns appended to a sub-table).
pub trait IndicatorRoutine {
    fn process(
        &mut self,
        algo_id: &str,
        ticker: &str,
        snapshot: &mut DatasetSnapshot,
    ) -> Result<(), TradesimError>;
}

/// Closures can serve as decision routines directly.
impl<F> DecisionRoutine for F
where
    F: FnMut(&StepContext<'_>) -> Result<Signal, TradesimError>,
{
    fn process(&mut self, ctx: &StepContext<'_>) -> Result<Signal, TradesimError> {
        self(ctx)
    }
}
