//! Data processing modules.

pub mod batch;
pub mod filtering;
pub mod pipeline;
pub mod time;
pub mod units;
pub mod zero_point;

// Re-export key types for convenience
pub use batch::{
    discover_inputs, process_file, run_batch, BatchError, BatchReport, FailedFile, FileSummary,
    OutputPaths,
};
pub use filtering::{apply_validity_gate, enforce_monotonic, FilterReport};
pub use pipeline::{CleanedCurves, CurveCleaner};
pub use time::{TimeNormalizer, TimeValue};
pub use units::{classify_scalar, normalize_unit, rescale_units, ScalarValue};
pub use zero_point::{find_zero_reference, zero_correct_time, ZeroReference};
