//! Core data types and I/O operations.

pub mod loaders;
pub mod table;
pub mod writers;

pub use loaders::{load_table, LoaderError};
pub use table::{Cell, Column, CurveTable, RawTable, COLUMN_COUNT};
pub use writers::{write_columns_tsv, write_displacement_load, WriteError};
