//! Batch cleaning of mechanical-testing (nanoindentation) instrument exports.
//!
//! This crate provides tools for:
//! - Loading eight-column spreadsheet or CSV exports
//! - Normalizing SI-prefixed values and duration/time-of-day timestamps
//! - Dropping invalid and out-of-order samples
//! - Re-zeroing time at contact and rescaling to µm / mN
//! - Writing the cleaned displacement/load curve as TSV and PNG plots
//!
//! # Example
//!
//! ```no_run
//! use indent_curves::{core::loaders::load_table, CurveCleaner, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let raw = load_table("test 1.xlsx", &config.layout).unwrap();
//! let cleaned = CurveCleaner::new(&config.units, &config.layout).clean(&raw, "test 1.xlsx");
//! println!("{} rows kept", cleaned.table.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{BatchConfig, LayoutConfig, PipelineConfig, PlotConfig, UnitConfig};
pub use core::table::{Column, CurveTable, RawTable};
pub use processors::pipeline::{CleanedCurves, CurveCleaner};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
