//! Zero-point correction of the time axis.
//!
//! Time zero is moved to the first sample where the indenter displacement is
//! no longer negative, i.e. the moment of contact.

use crate::core::table::{Column, CurveTable};

/// Which sample provided the reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroReference {
    /// First row with displacement >= 0.
    FirstNonNegative(usize),
    /// Last row with displacement == 0.
    ///
    /// Unreachable: zero already satisfies the non-negative test above it.
    /// Kept so the selection order stays explicit.
    LastZero(usize),
    /// No usable displacement sample; the first row is used.
    FirstRow,
}

impl ZeroReference {
    /// Row index of the reference sample.
    pub fn index(self) -> usize {
        match self {
            ZeroReference::FirstNonNegative(i) | ZeroReference::LastZero(i) => i,
            ZeroReference::FirstRow => 0,
        }
    }
}

/// Choose the reference sample for a displacement series.
///
/// NaN displacements are neither non-negative nor zero. Returns `None` for an
/// empty series.
pub fn find_zero_reference(displacement: &[f64]) -> Option<ZeroReference> {
    if displacement.is_empty() {
        return None;
    }

    if let Some(i) = displacement.iter().position(|&d| d >= 0.0) {
        Some(ZeroReference::FirstNonNegative(i))
    } else if let Some(i) = displacement.iter().rposition(|&d| d == 0.0) {
        Some(ZeroReference::LastZero(i))
    } else {
        Some(ZeroReference::FirstRow)
    }
}

/// Subtract the reference time from every value of `time`.
///
/// The reference row's time becomes exactly zero and all spacing between
/// samples is preserved. Returns the reference used, or `None` when the table
/// is empty (the table is left unchanged).
pub fn zero_correct_time(
    table: &mut CurveTable,
    time: Column,
    displacement: Column,
) -> Option<ZeroReference> {
    let reference = find_zero_reference(table.column(displacement))?;
    let shift = table.column(time)[reference.index()];

    for t in table.column_mut(time) {
        *t -= shift;
    }

    Some(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(times: Vec<f64>, disp: Vec<f64>) -> CurveTable {
        CurveTable::from_columns(&[
            (Column::PRIMARY_TIME, times),
            (Column::PRIMARY_DISPLACEMENT, disp),
        ])
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_first_non_negative_reference() {
        assert_eq!(
            find_zero_reference(&[-1.0, -0.5, 0.0, 2.0, 0.0]),
            Some(ZeroReference::FirstNonNegative(2))
        );
        assert_eq!(
            find_zero_reference(&[3.0, -1.0]),
            Some(ZeroReference::FirstNonNegative(0))
        );
    }

    #[test]
    fn test_all_negative_uses_first_row() {
        assert_eq!(
            find_zero_reference(&[-3.0, -2.0, -1.0]),
            Some(ZeroReference::FirstRow)
        );

        let mut t = table(vec![5.0, 6.0, 7.5], vec![-3.0, -2.0, -1.0]);
        let reference =
            zero_correct_time(&mut t, Column::PRIMARY_TIME, Column::PRIMARY_DISPLACEMENT);

        assert_eq!(reference, Some(ZeroReference::FirstRow));
        assert_close(t.column(Column::PRIMARY_TIME), &[0.0, 1.0, 2.5]);
    }

    #[test]
    fn test_nan_displacement_is_skipped() {
        assert_eq!(
            find_zero_reference(&[f64::NAN, -1.0, 0.5]),
            Some(ZeroReference::FirstNonNegative(2))
        );
        assert_eq!(
            find_zero_reference(&[f64::NAN, f64::NAN]),
            Some(ZeroReference::FirstRow)
        );
    }

    #[test]
    fn test_reference_time_becomes_exactly_zero() {
        let mut t = table(vec![0.1, 0.2, 0.3], vec![-1.0, 2.0, 3.0]);
        let reference =
            zero_correct_time(&mut t, Column::PRIMARY_TIME, Column::PRIMARY_DISPLACEMENT)
                .unwrap();

        assert_eq!(reference, ZeroReference::FirstNonNegative(1));
        assert_eq!(t.column(Column::PRIMARY_TIME)[reference.index()], 0.0);
        assert_close(t.column(Column::PRIMARY_TIME), &[-0.1, 0.0, 0.1]);
    }

    #[test]
    fn test_spacing_is_preserved() {
        let times = vec![1.0, 1.25, 2.0, 4.5, 4.75];
        let mut t = table(times.clone(), vec![-2.0, -1.0, 0.5, 1.0, 2.0]);
        zero_correct_time(&mut t, Column::PRIMARY_TIME, Column::PRIMARY_DISPLACEMENT);

        let shifted = t.column(Column::PRIMARY_TIME);
        for i in 1..times.len() {
            let before = times[i] - times[i - 1];
            let after = shifted[i] - shifted[i - 1];
            assert!((before - after).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_table_is_unchanged() {
        let mut t = CurveTable::new();
        assert_eq!(
            zero_correct_time(&mut t, Column::PRIMARY_TIME, Column::PRIMARY_DISPLACEMENT),
            None
        );
        assert!(t.is_empty());
    }

    #[test]
    fn test_reference_index() {
        assert_eq!(ZeroReference::FirstNonNegative(4).index(), 4);
        assert_eq!(ZeroReference::LastZero(2).index(), 2);
        assert_eq!(ZeroReference::FirstRow.index(), 0);
    }
}
