//! Result output port trait.

use crate::domain::engine::AlgorithmResult;
use crate::domain::error::TradesimError;
use crate::domain::metrics::PerformanceSummary;
use std::path::Path;

/// Port for serializing a finished run. The engine itself never serializes;
/// adapters implementing this trait own the output format.
pub trait ResultWriter {
    fn write(
        &self,
        result: &AlgorithmResult,
        summary: &PerformanceSummary,
        output_path: &Path,
    ) -> Result<(), TradesimError>;
}
