//! Configuration types for the curve-cleaning pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Metric-prefix and engineering-unit scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Trailing unit suffix -> SI scale factor (e.g. 'm' -> 1e-3)
    #[serde(default = "default_prefixes")]
    pub prefixes: HashMap<char, f64>,

    /// Multiplier applied to the displacement column (meters -> micrometers)
    #[serde(default = "default_displacement_scale")]
    pub displacement_scale: f64,

    /// Multiplier applied to the load column (newtons -> millinewtons)
    #[serde(default = "default_load_scale")]
    pub load_scale: f64,
}

fn default_prefixes() -> HashMap<char, f64> {
    let mut prefixes = HashMap::new();
    prefixes.insert('f', 1e-15); // femto
    prefixes.insert('p', 1e-12); // pico
    prefixes.insert('n', 1e-9); // nano
    prefixes.insert('u', 1e-6); // micro
    prefixes.insert('m', 1e-3); // milli
    prefixes
}

fn default_displacement_scale() -> f64 {
    1e6
}

fn default_load_scale() -> f64 {
    1e3
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            displacement_scale: default_displacement_scale(),
            load_scale: default_load_scale(),
        }
    }
}

/// Positional layout of the instrument export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Columns holding time values (durations, time-of-day or day fractions)
    #[serde(default = "default_time_columns")]
    pub time_columns: Vec<usize>,

    /// Columns holding scalars with a metric-prefix suffix
    #[serde(default = "default_unit_columns")]
    pub unit_columns: Vec<usize>,

    /// Leading rows (unit/header rows) discarded before parsing
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
}

fn default_time_columns() -> Vec<usize> {
    vec![0, 2, 4, 6]
}

fn default_unit_columns() -> Vec<usize> {
    vec![1, 3, 5, 7]
}

fn default_header_rows() -> usize {
    1
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            time_columns: default_time_columns(),
            unit_columns: default_unit_columns(),
            header_rows: default_header_rows(),
        }
    }
}

/// Figure style shared by every rendered image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Render PNG images (the text export is always written)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pixels per inch
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Font family for labels ("serif", "sans-serif", "monospace" or a font name)
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Line and axis width in points
    #[serde(default = "default_line_width")]
    pub line_width: f64,

    /// Inward tick length in points
    #[serde(default = "default_tick_length")]
    pub tick_length: f64,
}

fn default_true() -> bool {
    true
}

fn default_dpi() -> u32 {
    300
}

fn default_font_family() -> String {
    "serif".to_string()
}

fn default_font_size() -> f64 {
    14.0
}

fn default_line_width() -> f64 {
    1.5
}

fn default_tick_length() -> f64 {
    3.5
}

impl PlotConfig {
    /// Convert a length in inches to pixels at the configured DPI.
    pub fn pixels(&self, inches: f64) -> u32 {
        (inches * self.dpi as f64).round().max(1.0) as u32
    }

    /// Convert a length in points (1/72 inch) to pixels at the configured DPI.
    pub fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dpi: default_dpi(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            line_width: default_line_width(),
            tick_length: default_tick_length(),
        }
    }
}

/// Batch discovery and failure policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Wildcard pattern matched against file names (`*` and `?`)
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Directory for all outputs (defaults to next to each input)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Abort the batch on the first failing file
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_pattern() -> String {
    "*.xlsx".to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            output_dir: None,
            fail_fast: false,
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub units: UnitConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub plot: PlotConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
