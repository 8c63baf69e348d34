//! Plot rendering for cleaned curves.
//!
//! Every figure uses the same style: serif labels, axis frame on all four
//! sides and inward tick marks on every side. Figure sizes are given in
//! inches and scaled by the configured DPI.

use std::path::Path;

use plotters::coord::ranged1d::Ranged;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::core::table::{Column, CurveTable};
use crate::core::writers::{ensure_parent_dirs, WriteError};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] WriteError),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Empty table")]
    EmptyTable,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Single-panel figure size in inches.
const PANEL_SIZE_IN: (f64, f64) = (6.0, 4.0);

/// Three-panel figure size in inches.
const COMBINED_SIZE_IN: (f64, f64) = (18.0, 6.0);

/// Number of labelled ticks requested per axis.
const TICKS_PER_AXIS: usize = 6;

/// Fraction of the data span added on each side of an axis.
const AXIS_PADDING: f64 = 0.05;

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

pub const TIME_LABEL: &str = "Time, s";
pub const LOAD_LABEL: &str = "Load, mN";
pub const DISPLACEMENT_LABEL: &str = "Displacement, µm";

fn plot_err<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// One x/y curve with its axis labels.
#[derive(Debug, Clone, Copy)]
pub struct Curve<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl<'a> Curve<'a> {
    fn from_columns(
        table: &'a CurveTable,
        x: Column,
        y: Column,
        x_label: &'a str,
        y_label: &'a str,
    ) -> Self {
        Self {
            x: table.column(x),
            y: table.column(y),
            x_label,
            y_label,
        }
    }

    /// Finite (x, y) pairs in order.
    fn points(&self) -> Vec<(f64, f64)> {
        self.x
            .iter()
            .zip(self.y.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, y))
            .collect()
    }
}

fn time_vs_load(table: &CurveTable) -> Curve<'_> {
    Curve::from_columns(
        table,
        Column::PRIMARY_TIME,
        Column::PRIMARY_LOAD,
        TIME_LABEL,
        LOAD_LABEL,
    )
}

fn time_vs_displacement(table: &CurveTable) -> Curve<'_> {
    Curve::from_columns(
        table,
        Column::PRIMARY_TIME,
        Column::PRIMARY_DISPLACEMENT,
        TIME_LABEL,
        DISPLACEMENT_LABEL,
    )
}

fn displacement_vs_load(table: &CurveTable) -> Curve<'_> {
    Curve::from_columns(
        table,
        Column::PRIMARY_DISPLACEMENT,
        Column::PRIMARY_LOAD,
        DISPLACEMENT_LABEL,
        LOAD_LABEL,
    )
}

/// Shift a series so that its first sample sits at zero.
pub fn shift_to_origin(values: &[f64]) -> Vec<f64> {
    match values.first() {
        Some(&first) => values.iter().map(|v| v - first).collect(),
        None => Vec::new(),
    }
}

/// Compute padded axis bounds (x_min, x_max, y_min, y_max) for a set of points.
///
/// Degenerate spans are widened by one unit on each side.
pub fn compute_bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if points.is_empty() {
        return (-1.0, 1.0, -1.0, 1.0);
    }

    let (x_min, x_max) = pad_span(x_min, x_max);
    let (y_min, y_max) = pad_span(y_min, y_max);
    (x_min, x_max, y_min, y_max)
}

fn pad_span(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    if span.abs() < f64::EPSILON * max.abs().max(1.0) {
        (min - 1.0, max + 1.0)
    } else {
        (min - span * AXIS_PADDING, max + span * AXIS_PADDING)
    }
}

/// Draw one curve into a drawing area with the shared style.
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    curve: &Curve<'_>,
    config: &PlotConfig,
) -> Result<()> {
    let points = curve.points();
    let (x_min, x_max, y_min, y_max) = compute_bounds(&points);

    let font_px = config.points_to_pixels(config.font_size);
    let line_px = config.points_to_pixels(config.line_width).round().max(1.0) as u32;
    let tick_px = config.points_to_pixels(config.tick_length);
    let font = FontDesc::new(
        FontFamily::from(config.font_family.as_str()),
        font_px,
        FontStyle::Normal,
    );

    let mut chart = ChartBuilder::on(area)
        .margin((font_px * 0.8) as u32)
        .x_label_area_size((font_px * 3.0) as u32)
        .y_label_area_size((font_px * 4.5) as u32)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .set_all_tick_mark_size(0)
        .x_labels(TICKS_PER_AXIS)
        .y_labels(TICKS_PER_AXIS)
        .x_desc(curve.x_label)
        .y_desc(curve.y_label)
        .label_style(font.clone())
        .axis_desc_style(font)
        .axis_style(BLACK.stroke_width(line_px))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            LINE_COLOR.stroke_width(line_px),
        ))
        .map_err(plot_err)?;

    // Frame: top and right edges (left and bottom are the axes)
    let frame_style = BLACK.stroke_width(line_px);
    chart
        .draw_series([
            PathElement::new(vec![(x_min, y_max), (x_max, y_max)], frame_style),
            PathElement::new(vec![(x_max, y_min), (x_max, y_max)], frame_style),
        ])
        .map_err(plot_err)?;

    // Inward ticks on all four sides, at the labelled positions
    let (width_px, height_px) = chart.plotting_area().dim_in_pixel();
    let dx = (x_max - x_min) * tick_px / width_px.max(1) as f64;
    let dy = (y_max - y_min) * tick_px / height_px.max(1) as f64;

    let x_ticks: Vec<f64> = chart.as_coord_spec().x_spec().key_points(TICKS_PER_AXIS);
    let y_ticks: Vec<f64> = chart.as_coord_spec().y_spec().key_points(TICKS_PER_AXIS);

    let mut ticks = Vec::with_capacity(2 * (x_ticks.len() + y_ticks.len()));
    for &x in &x_ticks {
        ticks.push(vec![(x, y_min), (x, y_min + dy)]);
        ticks.push(vec![(x, y_max), (x, y_max - dy)]);
    }
    for &y in &y_ticks {
        ticks.push(vec![(x_min, y), (x_min + dx, y)]);
        ticks.push(vec![(x_max, y), (x_max - dx, y)]);
    }

    chart
        .draw_series(
            ticks
                .into_iter()
                .map(|segment| PathElement::new(segment, frame_style)),
        )
        .map_err(plot_err)?;

    Ok(())
}

/// Render curves side by side into one PNG.
fn render_panels(
    path: &Path,
    size_in: (f64, f64),
    curves: &[Curve<'_>],
    config: &PlotConfig,
) -> Result<()> {
    ensure_parent_dirs(path)?;

    let size = (config.pixels(size_in.0), config.pixels(size_in.1));
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let panels = root.split_evenly((1, curves.len().max(1)));
    for (panel, curve) in panels.iter().zip(curves) {
        draw_panel(panel, curve, config)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Plot a single curve as a 6x4 inch PNG.
pub fn plot_curve(path: &Path, curve: &Curve<'_>, config: &PlotConfig) -> Result<()> {
    render_panels(path, PANEL_SIZE_IN, std::slice::from_ref(curve), config)
}

/// Three-panel figure: time-load, time-displacement, displacement-load.
pub fn plot_combined(path: &Path, table: &CurveTable, config: &PlotConfig) -> Result<()> {
    if table.is_empty() {
        return Err(VisualizationError::EmptyTable);
    }

    let curves = [
        time_vs_load(table),
        time_vs_displacement(table),
        displacement_vs_load(table),
    ];
    render_panels(path, COMBINED_SIZE_IN, &curves, config)
}

/// The three panels of [`plot_combined`] as separate figures.
pub fn plot_individual(
    time_load_path: &Path,
    time_displacement_path: &Path,
    displacement_load_path: &Path,
    table: &CurveTable,
    config: &PlotConfig,
) -> Result<()> {
    if table.is_empty() {
        return Err(VisualizationError::EmptyTable);
    }

    plot_curve(time_load_path, &time_vs_load(table), config)?;
    plot_curve(time_displacement_path, &time_vs_displacement(table), config)?;
    plot_curve(displacement_load_path, &displacement_vs_load(table), config)?;
    Ok(())
}

/// Displacement-load curve with both series shifted so the first sample is the origin.
pub fn plot_adjusted(path: &Path, table: &CurveTable, config: &PlotConfig) -> Result<()> {
    if table.is_empty() {
        return Err(VisualizationError::EmptyTable);
    }

    let displacement = shift_to_origin(table.column(Column::PRIMARY_DISPLACEMENT));
    let load = shift_to_origin(table.column(Column::PRIMARY_LOAD));

    let curve = Curve {
        x: &displacement,
        y: &load,
        x_label: DISPLACEMENT_LABEL,
        y_label: LOAD_LABEL,
    };
    plot_curve(path, &curve, config)
}
