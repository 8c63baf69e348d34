//! Batch driver: discover exports, clean each one, write text and plots.
//!
//! Files are processed one after another with no shared state. A failing file
//! is logged and recorded in the [`BatchReport`]; the batch carries on unless
//! `fail_fast` is set.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use regex::Regex;
use thiserror::Error;

use super::pipeline::CurveCleaner;
use crate::config::PipelineConfig;
use crate::core::loaders::load_table;
use crate::core::writers::write_displacement_load;
use crate::visualization;

/// Errors that stop a batch before any file is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Translate a shell wildcard (`*`, `?`) into an anchored regex.
pub fn wildcard_to_regex(pattern: &str) -> std::result::Result<Regex, BatchError> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|source| BatchError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Find files in `directory` whose name matches `pattern`, sorted by path.
///
/// Office lock files (`~$name.xlsx`) are skipped.
pub fn discover_inputs(
    directory: &Path,
    pattern: &str,
) -> std::result::Result<Vec<PathBuf>, BatchError> {
    if !directory.is_dir() {
        return Err(BatchError::DirectoryNotFound(directory.to_path_buf()));
    }

    let matcher = wildcard_to_regex(pattern)?;

    let mut files: Vec<PathBuf> = fs::read_dir(directory)
        .map_err(|source| BatchError::ReadDirectory {
            path: directory.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name.starts_with("~$") {
                debug!("Skipping lock file {}", path.display());
                return false;
            }
            matcher.is_match(&name)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Output files derived from an input's stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub combined: PathBuf,
    pub time_vs_load: PathBuf,
    pub time_vs_displacement: PathBuf,
    pub displacement_vs_load: PathBuf,
    pub adjusted: PathBuf,
    pub data: PathBuf,
}

impl OutputPaths {
    /// Outputs go next to the input unless `output_dir` is given.
    pub fn for_input(input: &Path, output_dir: Option<&Path>) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let named = |suffix: &str| dir.join(format!("{}_{}", stem, suffix));

        Self {
            combined: named("combined_plots.png"),
            time_vs_load: named("time_vs_load.png"),
            time_vs_displacement: named("time_vs_displacement.png"),
            displacement_vs_load: named("displacement_vs_load.png"),
            adjusted: named("adjusted_displacement_load.png"),
            data: named("displacement_load.txt"),
        }
    }

    /// All image outputs.
    pub fn images(&self) -> [&Path; 5] {
        [
            &self.combined,
            &self.time_vs_load,
            &self.time_vs_displacement,
            &self.displacement_vs_load,
            &self.adjusted,
        ]
    }
}

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub input: PathBuf,
    /// Data rows read (header rows excluded).
    pub rows_read: usize,
    /// Rows in the cleaned table.
    pub rows_kept: usize,
    pub invalid_rows: usize,
    pub non_monotonic_rows: usize,
    pub outputs: Vec<PathBuf>,
}

/// A file that could not be processed.
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub input: PathBuf,
    pub error: String,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub found: usize,
    pub processed: Vec<FileSummary>,
    pub failed: Vec<FailedFile>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn rows_kept(&self) -> usize {
        self.processed.iter().map(|s| s.rows_kept).sum()
    }
}

/// Load, clean and export a single file.
pub fn process_file(
    input: &Path,
    cleaner: &CurveCleaner,
    config: &PipelineConfig,
) -> Result<FileSummary> {
    let raw = load_table(input, &config.layout)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| input.display().to_string());

    let cleaned = cleaner.clean(&raw, &file_name);
    let table = &cleaned.table;

    let paths = OutputPaths::for_input(input, config.batch.output_dir.as_deref());

    write_displacement_load(&paths.data, table)
        .with_context(|| format!("Failed to write {}", paths.data.display()))?;
    let mut outputs = vec![paths.data.clone()];

    if table.is_empty() {
        warn!("{}: no rows left after cleaning, skipping plots", file_name);
    } else if config.plot.enabled {
        visualization::plot_combined(&paths.combined, table, &config.plot)
            .with_context(|| format!("Failed to plot {}", paths.combined.display()))?;
        visualization::plot_individual(
            &paths.time_vs_load,
            &paths.time_vs_displacement,
            &paths.displacement_vs_load,
            table,
            &config.plot,
        )
        .with_context(|| format!("Failed to plot individual curves for {}", file_name))?;
        visualization::plot_adjusted(&paths.adjusted, table, &config.plot)
            .with_context(|| format!("Failed to plot {}", paths.adjusted.display()))?;

        outputs.extend(paths.images().iter().map(|p| p.to_path_buf()));
    }

    Ok(FileSummary {
        input: input.to_path_buf(),
        rows_read: raw.len(),
        rows_kept: table.len(),
        invalid_rows: cleaned.invalid_rows,
        non_monotonic_rows: cleaned.monotonic.removed,
        outputs,
    })
}

/// Process every matching file in `directory`.
///
/// # Errors
///
/// Returns an error if the directory or pattern is invalid, or, with
/// `fail_fast`, on the first file that fails.
pub fn run_batch(
    directory: &Path,
    config: &PipelineConfig,
    progress: &ProgressBar,
) -> Result<BatchReport> {
    let inputs = discover_inputs(directory, &config.batch.pattern)?;

    let mut report = BatchReport {
        found: inputs.len(),
        ..BatchReport::default()
    };

    if inputs.is_empty() {
        warn!(
            "No files matching '{}' in {}",
            config.batch.pattern,
            directory.display()
        );
        return Ok(report);
    }

    progress.set_length(inputs.len() as u64);
    let cleaner = CurveCleaner::new(&config.units, &config.layout);

    for input in &inputs {
        progress.set_message(
            input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        match process_file(input, &cleaner, config) {
            Ok(summary) => {
                info!(
                    "Processed {}: {} of {} rows kept",
                    input.display(),
                    summary.rows_kept,
                    summary.rows_read
                );
                report.processed.push(summary);
            }
            Err(e) => {
                error!("{:#}", e);
                if config.batch.fail_fast {
                    progress.abandon();
                    return Err(e.context(format!("Batch aborted at {}", input.display())));
                }
                report.failed.push(FailedFile {
                    input: input.clone(),
                    error: format!("{:#}", e),
                });
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(report)
}
