//! JSON result writer and console summary.

use crate::domain::engine::AlgorithmResult;
use crate::domain::error::TradesimError;
use crate::domain::metrics::PerformanceSummary;
use crate::ports::report_port::ResultWriter;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Writes the full run (result aggregate plus performance summary) as one
/// pretty-printed JSON document.
pub struct JsonResultWriter;

#[derive(Serialize)]
struct Report<'a> {
    result: &'a AlgorithmResult,
    summary: &'a PerformanceSummary,
}

impl ResultWriter for JsonResultWriter {
    fn write(
        &self,
        result: &AlgorithmResult,
        summary: &PerformanceSummary,
        output_path: &Path,
    ) -> Result<(), TradesimError> {
        let report = Report { result, summary };
        let content =
            serde_json::to_string_pretty(&report).map_err(|e| TradesimError::Provider {
                ticker: "*".to_string(),
                reason: format!("failed to serialize result: {}", e),
            })?;
        fs::write(output_path, content)?;
        Ok(())
    }
}

/// Console summary of a finished run, written to stderr so stdout stays
/// reserved for machine-readable output.
pub fn print_summary(summary: &PerformanceSummary) {
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Starting Balance: {:.2}", summary.starting_balance);
    eprintln!("Ending Balance:   {:.2}", summary.ending_balance);
    eprintln!("Net PnL:          {:+.2}", summary.net_pnl);
    eprintln!("Total Return:     {:.2}%", summary.total_return * 100.0);
    eprintln!("Max Drawdown:     -{:.1}%", summary.max_drawdown * 100.0);
    eprintln!("Steps Processed:  {}", summary.num_processed);
    eprintln!(
        "Buys:             {} filled, {} rejected",
        summary.buys_filled, summary.buys_rejected
    );
    eprintln!(
        "Sells:            {} filled, {} rejected",
        summary.sells_filled, summary.sells_rejected
    );
}
