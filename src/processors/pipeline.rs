//! The cleaning pipeline: raw export table to cleaned engineering-unit curves.
//!
//! Stages, in order:
//! 1. unit normalization of the unit columns
//! 2. time normalization of the time columns
//! 3. validity gate on the primary time column
//! 4. monotonicity filter on the primary time column
//! 5. zero-point correction against the primary displacement
//! 6. rescaling of displacement (µm) and load (mN)

use log::debug;

use super::filtering::{apply_validity_gate, enforce_monotonic, FilterReport};
use super::time::TimeNormalizer;
use super::units::{normalize_unit, rescale_units};
use super::zero_point::{zero_correct_time, ZeroReference};
use crate::config::{LayoutConfig, UnitConfig};
use crate::core::table::{Cell, Column, CurveTable, RawTable, COLUMN_COUNT};

/// Result of cleaning one export.
#[derive(Debug, Clone)]
pub struct CleanedCurves {
    pub table: CurveTable,
    /// Rows dropped by the validity gate.
    pub invalid_rows: usize,
    pub monotonic: FilterReport,
    /// Reference used for time zero, `None` if no rows survived.
    pub zero_reference: Option<ZeroReference>,
}

/// Role of a positional column in the export layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    Time,
    Unit,
    Plain,
}

/// Immutable per-run cleaning setup shared by every file.
#[derive(Debug, Clone)]
pub struct CurveCleaner {
    units: UnitConfig,
    roles: [ColumnRole; COLUMN_COUNT],
    time: TimeNormalizer,
}

impl CurveCleaner {
    pub fn new(units: &UnitConfig, layout: &LayoutConfig) -> Self {
        let roles = std::array::from_fn(|i| {
            if layout.time_columns.contains(&i) {
                ColumnRole::Time
            } else if layout.unit_columns.contains(&i) {
                ColumnRole::Unit
            } else {
                ColumnRole::Plain
            }
        });

        Self {
            units: units.clone(),
            roles,
            time: TimeNormalizer::new(),
        }
    }

    /// Normalize every cell of a row into seconds / SI values.
    pub fn normalize_row(&self, row: &[Cell; COLUMN_COUNT]) -> [Option<f64>; COLUMN_COUNT] {
        std::array::from_fn(|i| match self.roles[i] {
            ColumnRole::Time => self.time.normalize(&row[i]),
            ColumnRole::Unit => normalize_unit(&row[i], &self.units.prefixes),
            ColumnRole::Plain => row[i].coerce_numeric(),
        })
    }

    /// Run the full pipeline on a raw table.
    ///
    /// `file_name` is only used in log messages.
    pub fn clean(&self, raw: &RawTable, file_name: &str) -> CleanedCurves {
        let normalized: Vec<[Option<f64>; COLUMN_COUNT]> =
            raw.rows.iter().map(|row| self.normalize_row(row)).collect();

        let (table, invalid_rows) = apply_validity_gate(&normalized, Column::PRIMARY_TIME);
        self.clean_table(table, invalid_rows, file_name)
    }

    /// Run the stages after the validity gate on an already numeric table.
    pub fn clean_table(
        &self,
        mut table: CurveTable,
        invalid_rows: usize,
        file_name: &str,
    ) -> CleanedCurves {
        let monotonic = enforce_monotonic(&mut table, Column::PRIMARY_TIME, file_name);

        let zero_reference =
            zero_correct_time(&mut table, Column::PRIMARY_TIME, Column::PRIMARY_DISPLACEMENT);
        debug!("{}: time zero reference {:?}", file_name, zero_reference);

        rescale_units(
            &mut table,
            Column::PRIMARY_DISPLACEMENT,
            Column::PRIMARY_LOAD,
            &self.units,
        );

        CleanedCurves {
            table,
            invalid_rows,
            monotonic,
            zero_reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> CurveCleaner {
        CurveCleaner::new(&UnitConfig::default(), &LayoutConfig::default())
    }

    fn row(time: &str, disp: &str, load: &str) -> [Cell; COLUMN_COUNT] {
        RawTable::row_from(vec![
            Cell::from(time),
            Cell::from(disp),
            Cell::from(time),
            Cell::from(load),
            Cell::from(time),
            Cell::from(disp),
            Cell::from(time),
            Cell::from(load),
        ])
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a - e).abs() <= 1e-9 * e.abs().max(1.0),
                "{:?} != {:?}",
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_normalize_row_uses_column_roles() {
        let normalized = cleaner().normalize_row(&row("0:00:01.5", "2u", "3m"));

        assert_eq!(normalized[0], Some(1.5));
        assert!((normalized[1].unwrap() - 2e-6).abs() < 1e-18);
        assert!((normalized[3].unwrap() - 3e-3).abs() < 1e-15);
        assert_eq!(normalized[6], Some(1.5));
    }

    #[test]
    fn test_seconds_scenario_from_cleaned_table() {
        // Times already in seconds, displacement in meters
        let table = CurveTable::from_columns(&[
            (Column::PRIMARY_TIME, vec![0.1, 0.05, 0.2, 0.3]),
            (Column::PRIMARY_DISPLACEMENT, vec![-1.0, -1.0, 2.0, 3.0]),
            (Column::PRIMARY_LOAD, vec![0.0, 0.0, 0.0, 0.0]),
        ]);

        let cleaned = cleaner().clean_table(table, 0, "scenario.xlsx");

        assert_eq!(cleaned.monotonic.removed, 1);
        assert_eq!(cleaned.zero_reference, Some(ZeroReference::FirstNonNegative(1)));
        assert_close(cleaned.table.column(Column::PRIMARY_TIME), &[-0.1, 0.0, 0.1]);
        assert_close(
            cleaned.table.column(Column::PRIMARY_DISPLACEMENT),
            &[-1e6, 2e6, 3e6],
        );
    }

    #[test]
    fn test_full_pipeline_from_raw_cells() {
        let raw = RawTable::new(vec![
            row("0:00:00.1", "-1u", "1m"),
            row("0:00:00.05", "-1u", "1m"),
            row("0:00:00.2", "2u", "5m"),
            row("not a time", "9u", "9m"),
            row("0:00:00.3", "3u", "7.5m"),
        ]);

        let cleaned = cleaner().clean(&raw, "run.xlsx");

        assert_eq!(cleaned.invalid_rows, 1);
        assert_eq!(cleaned.monotonic.removed, 1);
        assert_eq!(cleaned.table.len(), 3);
        assert_close(cleaned.table.column(Column::PRIMARY_TIME), &[-0.1, 0.0, 0.1]);
        // µm and mN
        assert_close(
            cleaned.table.column(Column::PRIMARY_DISPLACEMENT),
            &[-1.0, 2.0, 3.0],
        );
        assert_close(cleaned.table.column(Column::PRIMARY_LOAD), &[1.0, 5.0, 7.5]);
        // Raw channel is normalized but not rescaled
        assert_close(
            cleaned.table.column(Column::LoadRawLoad),
            &[1e-3, 5e-3, 7.5e-3],
        );
    }

    #[test]
    fn test_all_negative_displacement_rebases_on_first_row() {
        let raw = RawTable::new(vec![
            row("0:00:02", "-3u", "1m"),
            row("0:00:03", "-2u", "1m"),
            row("0:00:05", "-1u", "1m"),
        ]);

        let cleaned = cleaner().clean(&raw, "neg.xlsx");

        assert_eq!(cleaned.zero_reference, Some(ZeroReference::FirstRow));
        assert_close(cleaned.table.column(Column::PRIMARY_TIME), &[0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_unparsed_measurements_become_nan() {
        let raw = RawTable::new(vec![row("0:00:01", "oops", "1m"), row("0:00:02", "1u", "??")]);

        let cleaned = cleaner().clean(&raw, "nan.xlsx");

        assert_eq!(cleaned.table.len(), 2);
        assert!(cleaned.table.column(Column::PRIMARY_DISPLACEMENT)[0].is_nan());
        assert!(cleaned.table.column(Column::PRIMARY_LOAD)[1].is_nan());
        // NaN displacement is skipped when choosing time zero
        assert_eq!(cleaned.zero_reference, Some(ZeroReference::FirstNonNegative(1)));
    }

    #[test]
    fn test_no_valid_rows() {
        let raw = RawTable::new(vec![row("x", "1u", "1m")]);

        let cleaned = cleaner().clean(&raw, "bad.xlsx");

        assert!(cleaned.table.is_empty());
        assert_eq!(cleaned.invalid_rows, 1);
        assert_eq!(cleaned.zero_reference, None);
    }
}
