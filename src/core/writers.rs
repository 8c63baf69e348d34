//! Text exports for cleaned curves.
//!
//! The displacement/load export is a tab-separated file with a header row
//! naming the columns, one row per cleaned record. Missing values are written
//! as empty fields.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use super::table::{Column, CurveTable};

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
pub(crate) fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Format a value for text export; NaN becomes an empty field.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Write selected columns of a table as tab-separated text.
///
/// # Arguments
///
/// * `path` - Output file path (parent directories will be created if needed)
/// * `table` - Cleaned table
/// * `columns` - Columns to export, in output order
pub fn write_columns_tsv(path: &Path, table: &CurveTable, columns: &[Column]) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut tsv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(BufWriter::new(file));

    let path_str = path.display().to_string();

    tsv_writer
        .write_record(columns.iter().map(|c| c.name()))
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for i in 0..table.len() {
        tsv_writer
            .write_record(columns.iter().map(|&c| format_value(table.column(c)[i])))
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    tsv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write the corrected displacement and load columns as tab-separated text.
///
/// # Example
///
/// ```no_run
/// use indent_curves::core::table::CurveTable;
/// use indent_curves::core::writers::write_displacement_load;
/// use std::path::Path;
///
/// let table = CurveTable::new();
/// write_displacement_load(Path::new("run_displacement_load.txt"), &table).unwrap();
/// ```
pub fn write_displacement_load(path: &Path, table: &CurveTable) -> Result<()> {
    write_columns_tsv(
        path,
        table,
        &[Column::PRIMARY_DISPLACEMENT, Column::PRIMARY_LOAD],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_table() -> CurveTable {
        CurveTable::from_columns(&[
            (Column::PRIMARY_TIME, vec![0.0, 0.1, 0.2]),
            (Column::PRIMARY_DISPLACEMENT, vec![0.0, 1.5, f64::NAN]),
            (Column::PRIMARY_LOAD, vec![2.0, 3.25, 4.0]),
        ])
    }

    #[test]
    fn test_write_displacement_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run_displacement_load.txt");

        write_displacement_load(&path, &create_test_table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(
            lines[0],
            "Displacement_Corrected_Displacement\tLoad_Corrected_Load"
        );
        assert_eq!(lines.len(), 4); // header + 3 data rows
        assert_eq!(lines[1], "0\t2");
        assert_eq!(lines[2], "1.5\t3.25");
        assert_eq!(lines[3], "\t4");
    }

    #[test]
    fn test_write_empty_table_writes_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");

        write_displacement_load(&path, &CurveTable::new()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("data.txt");

        write_columns_tsv(&path, &create_test_table(), &[Column::PRIMARY_TIME]).unwrap();

        assert!(path.exists());
    }
}
