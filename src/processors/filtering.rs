//! Row filters: primary-time validity gate and monotonicity enforcement.

use log::{debug, info};

use crate::core::table::{Column, CurveTable, COLUMN_COUNT};

/// Outcome of [`enforce_monotonic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    /// Column the ordering was enforced on.
    pub column: Column,
    /// Rows before filtering.
    pub original_rows: usize,
    /// Rows removed.
    pub removed: usize,
    /// Marking passes that removed at least one row.
    pub passes: usize,
}

/// Build a table from normalized rows, dropping every row whose `primary`
/// value is missing or NaN. Missing values in other columns become NaN.
///
/// Returns the table and the number of dropped rows.
pub fn apply_validity_gate(
    rows: &[[Option<f64>; COLUMN_COUNT]],
    primary: Column,
) -> (CurveTable, usize) {
    let mut table = CurveTable::with_capacity(rows.len());
    let mut dropped = 0;

    for row in rows {
        match row[primary.index()] {
            Some(t) if !t.is_nan() => {
                table.push_row(row.map(|v| v.unwrap_or(f64::NAN)));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} rows with non-numeric {}", dropped, primary);
    }

    (table, dropped)
}

/// Mark every row whose time is less than or equal to the time of the row
/// immediately before it in `times`. The first row is never marked.
pub fn mark_non_increasing(times: &[f64]) -> Vec<bool> {
    let mut marks = vec![false; times.len()];
    for i in 1..times.len() {
        if times[i] <= times[i - 1] {
            marks[i] = true;
        }
    }
    marks
}

/// Remove rows until `time_column` is strictly increasing.
///
/// Each pass marks rows against the sequence as it stood at the start of the
/// pass and removes them together at the end. A single pass is not enough:
/// `[1, 5, 2, 3]` loses `2` but keeps `3 < 5`. Passes therefore repeat until
/// one marks nothing. An already ordered table reports `passes == 0`. Empty
/// and single-row tables are unchanged.
pub fn enforce_monotonic(
    table: &mut CurveTable,
    time_column: Column,
    file_name: &str,
) -> FilterReport {
    let original_rows = table.len();
    let mut passes = 0;

    loop {
        let marks = mark_non_increasing(table.column(time_column));
        if !marks.iter().any(|&m| m) {
            break;
        }
        let keep: Vec<bool> = marks.iter().map(|&m| !m).collect();
        table.retain_rows(&keep);
        passes += 1;
    }

    let removed = original_rows - table.len();
    if removed > 0 {
        info!(
            "In file {}, {} rows deleted to ensure {} is monotonically increasing.",
            file_name, removed, time_column
        );
    }

    FilterReport {
        column: time_column,
        original_rows,
        removed,
        passes,
    }
}
