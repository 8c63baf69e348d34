//! Data loaders for instrument exports.
//!
//! This module reads the fixed eight-column layout from:
//! - Spreadsheet workbooks (`.xlsx`, `.xlsm`, `.xls`, `.ods`), first worksheet
//! - Comma-separated text exports (`.csv`)
//!
//! Cells are returned untyped; interpretation happens in the processors.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::NaiveTime;
use csv::ReaderBuilder;
use thiserror::Error;

use super::table::{Cell, RawTable, COLUMN_COUNT};
use crate::config::LayoutConfig;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("No worksheet in workbook: {0}")]
    NoWorksheet(PathBuf),

    #[error("Expected {expected} columns in {path}, found {found}")]
    UnexpectedColumnCount {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Input formats understood by [`load_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Workbook,
    Csv,
}

impl InputFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(InputFormat::Workbook),
            "csv" => Some(InputFormat::Csv),
            _ => None,
        }
    }
}

/// Load an instrument export, dispatching on the file extension.
///
/// The first `layout.header_rows` rows are discarded without being
/// interpreted. The export must have exactly eight columns.
pub fn load_table<P: AsRef<Path>>(path: P, layout: &LayoutConfig) -> Result<RawTable> {
    let path = path.as_ref();
    match InputFormat::from_path(path) {
        Some(InputFormat::Workbook) => load_workbook(path, layout),
        Some(InputFormat::Csv) => load_csv(path, layout),
        None => Err(LoaderError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load the first worksheet of a spreadsheet workbook.
pub fn load_workbook<P: AsRef<Path>>(path: P, layout: &LayoutConfig) -> Result<RawTable> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoaderError::NoWorksheet(path.to_path_buf()))??;

    if range.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    check_width(path, range.width())?;

    let rows = range
        .rows()
        .skip(layout.header_rows)
        .map(|row| RawTable::row_from(row.iter().map(cell_from_data)))
        .collect();

    Ok(RawTable {
        rows,
        source_path: Some(path.to_path_buf()),
    })
}

/// Load a comma-separated export with the same layout as the workbook.
///
/// Fields that parse as numbers become [`Cell::Number`], empty fields become
/// [`Cell::Empty`] and everything else is kept as text.
pub fn load_csv<P: AsRef<Path>>(path: P, layout: &LayoutConfig) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut width = 0;
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        width = width.max(record.len());
        records.push(record);
    }

    if records.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    check_width(path, width)?;

    let rows = records
        .iter()
        .skip(layout.header_rows)
        .map(|record| RawTable::row_from(record.iter().map(cell_from_field)))
        .collect();

    Ok(RawTable {
        rows,
        source_path: Some(path.to_path_buf()),
    })
}

fn check_width(path: &Path, found: usize) -> Result<()> {
    if found != COLUMN_COUNT {
        return Err(LoaderError::UnexpectedColumnCount {
            path: path.to_path_buf(),
            expected: COLUMN_COUNT,
            found,
        });
    }
    Ok(())
}

fn cell_from_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        Cell::Empty
    } else if let Ok(value) = trimmed.parse::<f64>() {
        Cell::Number(value)
    } else {
        Cell::Text(field.to_string())
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => cell_from_excel_datetime(dt),
        Data::DateTimeIso(s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
            .map(Cell::TimeOfDay)
            .unwrap_or(Cell::Other),
        Data::Empty => Cell::Empty,
        _ => Cell::Other,
    }
}

/// Spreadsheet date-time cells: durations become seconds, serials inside the
/// first day become a time of day, full dates are not time values.
fn cell_from_excel_datetime(dt: &ExcelDateTime) -> Cell {
    let serial = dt.as_f64();
    if dt.is_duration() {
        Cell::Duration(serial * SECONDS_PER_DAY)
    } else if (0.0..1.0).contains(&serial) {
        time_of_day_from_fraction(serial)
            .map(Cell::TimeOfDay)
            .unwrap_or(Cell::Other)
    } else {
        Cell::Other
    }
}

/// Last representable microsecond of a day.
const MAX_MICROS_OF_DAY: u64 = 86_399_999_999;

/// Convert a fraction of a day to a wall-clock time with microsecond precision.
///
/// Fractions that round up to midnight of the next day are clamped to the
/// last microsecond of the day.
pub fn time_of_day_from_fraction(fraction: f64) -> Option<NaiveTime> {
    if !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let micros = ((fraction * SECONDS_PER_DAY * 1e6).round() as u64).min(MAX_MICROS_OF_DAY);
    let secs = (micros / 1_000_000) as u32;
    let nanos = ((micros % 1_000_000) * 1_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use rust_xlsxwriter::{Format, Workbook};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            InputFormat::from_path(Path::new("run1.XLSX")),
            Some(InputFormat::Workbook)
        );
        assert_eq!(
            InputFormat::from_path(Path::new("run1.csv")),
            Some(InputFormat::Csv)
        );
        assert_eq!(InputFormat::from_path(Path::new("run1.txt")), None);
        assert_eq!(InputFormat::from_path(Path::new("run1")), None);
    }

    #[test]
    fn test_load_csv_skips_header_row() -> Result<()> {
        let file = csv_file(&[
            "s,m,s,N,s,m,s,N",
            "0:00:00.1,-1u,0:00:00.1,5m,0:00:00.1,-1u,0:00:00.1,5m",
            "0:00:00.2,2u,0:00:00.2,6m,0:00:00.2,2u,0:00:00.2,6m",
        ]);

        let table = load_table(file.path(), &LayoutConfig::default())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], Cell::from("0:00:00.1"));
        assert_eq!(table.rows[1][3], Cell::from("6m"));
        assert_eq!(table.source_path.as_deref(), Some(file.path()));

        Ok(())
    }

    #[test]
    fn test_load_csv_field_types() -> Result<()> {
        let file = csv_file(&["h,h,h,h,h,h,h,h", "0.5,,abc,1e-3,x,y,z,w"]);

        let table = load_csv(file.path(), &LayoutConfig::default())?;
        let row = &table.rows[0];
        assert_eq!(row[0], Cell::Number(0.5));
        assert_eq!(row[1], Cell::Empty);
        assert_eq!(row[2], Cell::from("abc"));
        assert_eq!(row[3], Cell::Number(1e-3));

        Ok(())
    }

    #[test]
    fn test_load_csv_short_rows_are_padded() -> Result<()> {
        let file = csv_file(&["a,b,c,d,e,f,g,h", "1,2,3"]);

        let table = load_csv(file.path(), &LayoutConfig::default())?;
        assert_eq!(table.rows[0][2], Cell::Number(3.0));
        assert_eq!(table.rows[0][7], Cell::Empty);

        Ok(())
    }

    #[test]
    fn test_load_csv_wrong_column_count() {
        let file = csv_file(&["a,b,c", "1,2,3"]);

        match load_csv(file.path(), &LayoutConfig::default()) {
            Err(LoaderError::UnexpectedColumnCount {
                expected, found, ..
            }) => {
                assert_eq!(expected, 8);
                assert_eq!(found, 3);
            }
            other => panic!("Expected UnexpectedColumnCount, got {:?}", other),
        }
    }

    #[test]
    fn test_load_csv_empty_file() {
        let file = csv_file(&[]);
        assert!(matches!(
            load_csv(file.path(), &LayoutConfig::default()),
            Err(LoaderError::EmptyFile(_))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            load_table("notes.txt", &LayoutConfig::default()),
            Err(LoaderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_time_of_day_from_fraction() {
        // 06:00:00.5
        let fraction = (6.0 * 3600.0 + 0.5) / SECONDS_PER_DAY;
        let time = time_of_day_from_fraction(fraction).unwrap();
        assert_eq!(time.hour(), 6);
        assert_eq!(time.minute(), 0);
        assert_eq!(time.second(), 0);
        assert_eq!(time.nanosecond(), 500_000_000);

        assert!(time_of_day_from_fraction(1.0).is_none());
        assert!(time_of_day_from_fraction(-0.1).is_none());
    }

    #[test]
    fn test_time_of_day_just_before_midnight() {
        // Rounds to 86_400_000_000 µs without the clamp
        let fraction = (SECONDS_PER_DAY - 4e-7) / SECONDS_PER_DAY;
        assert!(fraction < 1.0);

        let time = time_of_day_from_fraction(fraction).unwrap();
        assert_eq!(time.hour(), 23);
        assert_eq!(time.minute(), 59);
        assert_eq!(time.second(), 59);
        assert_eq!(time.nanosecond(), 999_999_000);
    }

    fn write_workbook(path: &Path, near_midnight: f64) {
        let mut workbook = Workbook::new();
        let time_format = Format::new().set_num_format("hh:mm:ss");
        let duration_format = Format::new().set_num_format("[h]:mm:ss");
        let sheet = workbook.add_worksheet();

        for col in 0..8u16 {
            sheet.write_string(0, col, "unit").unwrap();
        }

        sheet.write_number_with_format(1, 0, 0.5, &time_format).unwrap();
        sheet.write_string(1, 1, "12.5u").unwrap();
        sheet.write_number_with_format(1, 2, 1.5, &duration_format).unwrap();
        sheet.write_number(1, 3, 0.25).unwrap();
        sheet.write_string(1, 4, "0:00:01.5").unwrap();
        sheet.write_string(1, 5, "3m").unwrap();
        sheet.write_number(1, 6, 7).unwrap();
        sheet.write_string(1, 7, "2m").unwrap();

        sheet
            .write_number_with_format(2, 0, near_midnight, &time_format)
            .unwrap();
        for col in 1..8u16 {
            sheet.write_number(2, col, 1.0).unwrap();
        }

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_load_workbook_cell_types() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.xlsx");
        let near_midnight = (SECONDS_PER_DAY - 4e-7) / SECONDS_PER_DAY;
        write_workbook(&path, near_midnight);

        let table = load_table(&path, &LayoutConfig::default())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.source_path.as_deref(), Some(path.as_path()));

        let row = &table.rows[0];
        assert_eq!(
            row[0],
            Cell::TimeOfDay(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
        );
        assert_eq!(row[1], Cell::from("12.5u"));
        match row[2] {
            Cell::Duration(seconds) => assert!((seconds - 129_600.0).abs() < 1e-6),
            ref other => panic!("Expected duration cell, got {:?}", other),
        }
        assert_eq!(row[3], Cell::Number(0.25));
        assert_eq!(row[4], Cell::from("0:00:01.5"));
        assert_eq!(row[6], Cell::Number(7.0));

        // Near-midnight time of day stays a valid time
        match table.rows[1][0] {
            Cell::TimeOfDay(time) => assert_eq!(time.hour(), 23),
            ref other => panic!("Expected time of day, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_load_workbook_wrong_column_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrow.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for col in 0..3u16 {
            sheet.write_string(0, col, "unit").unwrap();
            sheet.write_number(1, col, 1.0).unwrap();
        }
        workbook.save(&path).unwrap();

        assert!(matches!(
            load_workbook(&path, &LayoutConfig::default()),
            Err(LoaderError::UnexpectedColumnCount { found: 3, .. })
        ));
    }
}
