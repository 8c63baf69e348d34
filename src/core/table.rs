//! Record tables for instrument exports.
//!
//! A [`RawTable`] holds untyped cells exactly as read from the export; a
//! [`CurveTable`] holds the eight named numeric columns produced by the
//! cleaning pipeline, stored column-wise.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveTime;

/// Number of positional fields in every export row.
pub const COLUMN_COUNT: usize = 8;

/// An untyped cell value as read from a spreadsheet or CSV export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value.
    Empty,
    /// A numeric cell.
    Number(f64),
    /// A text cell, e.g. `"12.5u"` or `"00:01:02.5"`.
    Text(String),
    /// A cell formatted as a time of day.
    TimeOfDay(NaiveTime),
    /// A cell formatted as an elapsed duration, in seconds.
    Duration(f64),
    /// Anything else (booleans, error cells, full date-times).
    Other,
}

impl Cell {
    /// Coerce the cell to a number the way a lenient numeric conversion would:
    /// numbers pass, numeric text is parsed, everything else is missing.
    pub fn coerce_numeric(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

/// The eight semantic columns of a cleaned export, in positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    TimeCorrectedDisplacement,
    DisplacementCorrectedDisplacement,
    TimeCorrectedLoad,
    LoadCorrectedLoad,
    RawTimeRawDisplacement,
    DisplacementRawDisplacement,
    RawTimeRawLoad,
    LoadRawLoad,
}

impl Column {
    /// All columns in positional order.
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::TimeCorrectedDisplacement,
        Column::DisplacementCorrectedDisplacement,
        Column::TimeCorrectedLoad,
        Column::LoadCorrectedLoad,
        Column::RawTimeRawDisplacement,
        Column::DisplacementRawDisplacement,
        Column::RawTimeRawLoad,
        Column::LoadRawLoad,
    ];

    /// Time column every later stage orders and rebases on.
    pub const PRIMARY_TIME: Column = Column::TimeCorrectedDisplacement;

    /// Displacement column used for zero-point correction and plotting.
    pub const PRIMARY_DISPLACEMENT: Column = Column::DisplacementCorrectedDisplacement;

    /// Load column used for plotting and export.
    pub const PRIMARY_LOAD: Column = Column::LoadCorrectedLoad;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Column> {
        Self::ALL.get(index).copied()
    }

    /// Header name used in exports and log messages.
    pub fn name(self) -> &'static str {
        match self {
            Column::TimeCorrectedDisplacement => "Time_Corrected_Displacement",
            Column::DisplacementCorrectedDisplacement => "Displacement_Corrected_Displacement",
            Column::TimeCorrectedLoad => "Time_Corrected_Load",
            Column::LoadCorrectedLoad => "Load_Corrected_Load",
            Column::RawTimeRawDisplacement => "Raw_Time_Raw_Displacement",
            Column::DisplacementRawDisplacement => "Displacement_Raw_Displacement",
            Column::RawTimeRawLoad => "Raw_Time_Raw_Load",
            Column::LoadRawLoad => "Load_Raw_Load",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows of untyped cells, header rows already removed.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<[Cell; COLUMN_COUNT]>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl RawTable {
    pub fn new(rows: Vec<[Cell; COLUMN_COUNT]>) -> Self {
        Self {
            rows,
            source_path: None,
        }
    }

    /// Build a row from any number of cells, padding missing fields with
    /// [`Cell::Empty`] and ignoring extras.
    pub fn row_from<I: IntoIterator<Item = Cell>>(cells: I) -> [Cell; COLUMN_COUNT] {
        let mut cells = cells.into_iter();
        std::array::from_fn(|_| cells.next().unwrap_or(Cell::Empty))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column-wise numeric table with the eight semantic columns.
///
/// Missing values in non-primary columns are stored as NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveTable {
    columns: [Vec<f64>; COLUMN_COUNT],
}

impl CurveTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: std::array::from_fn(|_| Vec::with_capacity(capacity)),
        }
    }

    /// Build a table from explicit columns; unspecified columns are filled with NaN.
    ///
    /// # Panics
    ///
    /// Panics if the supplied columns differ in length.
    pub fn from_columns(columns: &[(Column, Vec<f64>)]) -> Self {
        let len = columns.first().map_or(0, |(_, values)| values.len());
        assert!(
            columns.iter().all(|(_, values)| values.len() == len),
            "all columns must have the same length"
        );

        let mut table = Self {
            columns: std::array::from_fn(|_| vec![f64::NAN; len]),
        };
        for (column, values) in columns {
            table.columns[column.index()] = values.clone();
        }
        table
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn column(&self, column: Column) -> &[f64] {
        &self.columns[column.index()]
    }

    #[inline]
    pub fn column_mut(&mut self, column: Column) -> &mut [f64] {
        &mut self.columns[column.index()]
    }

    /// Append one row in positional order.
    pub fn push_row(&mut self, row: [f64; COLUMN_COUNT]) {
        for (values, value) in self.columns.iter_mut().zip(row) {
            values.push(value);
        }
    }

    /// Return a row in positional order.
    pub fn row(&self, index: usize) -> Option<[f64; COLUMN_COUNT]> {
        if index >= self.len() {
            return None;
        }
        Some(std::array::from_fn(|c| self.columns[c][index]))
    }

    /// Keep only the rows whose entry in `keep` is true.
    ///
    /// # Panics
    ///
    /// Panics if `keep` does not have one entry per row.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        assert_eq!(keep.len(), self.len(), "mask length must match row count");

        for values in self.columns.iter_mut() {
            let mut flags = keep.iter();
            values.retain(|_| flags.next().copied().unwrap_or(false));
        }
    }
}
