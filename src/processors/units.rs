//! Metric-prefix parsing and engineering-unit rescaling.

use std::collections::HashMap;

use crate::config::UnitConfig;
use crate::core::table::{Cell, Column, CurveTable};

/// Classification of a cell from a unit column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    /// Text with a recognised trailing prefix, e.g. `"12.5u"`.
    Prefixed { mantissa: f64, prefix: char, scale: f64 },
    /// A number, or text that is already a plain number.
    Plain(f64),
    /// Anything that does not yield a number.
    Unparsed,
}

impl ScalarValue {
    /// SI value of the cell, or `None` for unparsed cells.
    pub fn value(self) -> Option<f64> {
        match self {
            ScalarValue::Prefixed { mantissa, scale, .. } => Some(mantissa * scale),
            ScalarValue::Plain(v) => Some(v),
            ScalarValue::Unparsed => None,
        }
    }
}

/// Classify a unit-column cell against the prefix table.
///
/// Text ending in a known prefix has its leading part parsed as a float.
/// Text with an unknown trailing character is left for numeric coercion, so
/// `"12.5"` is plain while `"12.5x"` is unparsed. A known prefix with a
/// malformed mantissa (`"abcm"`) is unparsed rather than an error.
pub fn classify_scalar(cell: &Cell, prefixes: &HashMap<char, f64>) -> ScalarValue {
    let text = match cell {
        Cell::Text(text) => text.trim(),
        Cell::Number(v) => return ScalarValue::Plain(*v),
        _ => return ScalarValue::Unparsed,
    };

    if let Some(prefix) = text.chars().last() {
        if let Some(&scale) = prefixes.get(&prefix) {
            let head = &text[..text.len() - prefix.len_utf8()];
            return match head.trim().parse::<f64>() {
                Ok(mantissa) => ScalarValue::Prefixed {
                    mantissa,
                    prefix,
                    scale,
                },
                Err(_) => ScalarValue::Unparsed,
            };
        }
    }

    match cell.coerce_numeric() {
        Some(v) => ScalarValue::Plain(v),
        None => ScalarValue::Unparsed,
    }
}

/// Normalize a unit-column cell to its SI value.
#[inline]
pub fn normalize_unit(cell: &Cell, prefixes: &HashMap<char, f64>) -> Option<f64> {
    classify_scalar(cell, prefixes).value()
}

/// Rescale displacement and load columns into engineering units.
///
/// Multiplies `displacement` by `units.displacement_scale` (m -> µm) and
/// `load` by `units.load_scale` (N -> mN). Applying this twice scales twice.
pub fn rescale_units(
    table: &mut CurveTable,
    displacement: Column,
    load: Column,
    units: &UnitConfig,
) {
    for value in table.column_mut(displacement) {
        *value *= units.displacement_scale;
    }
    for value in table.column_mut(load) {
        *value *= units.load_scale;
    }
}
