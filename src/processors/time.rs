//! Conversion of heterogeneous time cells to elapsed seconds.

use chrono::{NaiveTime, Timelike};
use regex::Regex;

use crate::core::table::Cell;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Classification of a cell from a time column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeValue {
    /// Clock duration (`"H:MM:SS.fff"` text or a duration cell), in seconds.
    Duration(f64),
    /// Wall-clock time of day.
    TimeOfDay(NaiveTime),
    /// Plain number interpreted as a fraction of a 24-hour day.
    DayFraction(f64),
    /// Not a time value.
    Unrecognized,
}

impl TimeValue {
    /// Elapsed seconds, or `None` when unrecognized.
    pub fn seconds(self) -> Option<f64> {
        match self {
            TimeValue::Duration(secs) => Some(secs),
            TimeValue::TimeOfDay(t) => Some(
                t.hour() as f64 * 3600.0
                    + t.minute() as f64 * 60.0
                    + t.second() as f64
                    + (t.nanosecond() / 1_000) as f64 * 1e-6,
            ),
            TimeValue::DayFraction(fraction) => Some(fraction * SECONDS_PER_DAY),
            TimeValue::Unrecognized => None,
        }
    }
}

/// Classifies time cells and converts them to seconds.
///
/// Holds the compiled duration pattern so it is built once per run.
#[derive(Debug, Clone)]
pub struct TimeNormalizer {
    duration_pattern: Regex,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeNormalizer {
    pub fn new() -> Self {
        let duration_pattern = Regex::new(
            r"^(?P<sign>[-+])?(?:(?P<days>\d+)\s+days?,?\s+)?(?P<hours>\d+):(?P<minutes>\d+):(?P<seconds>\d+(?:\.\d*)?)$",
        )
        .expect("duration pattern is valid");
        Self { duration_pattern }
    }

    /// Parse a clock duration such as `"01:02:03.5"` or `"1 day 00:00:10"`.
    pub fn parse_duration(&self, text: &str) -> Option<f64> {
        let caps = self.duration_pattern.captures(text.trim())?;

        let days: f64 = caps
            .name("days")
            .map_or(Ok(0.0), |m| m.as_str().parse())
            .ok()?;
        let hours: f64 = caps["hours"].parse().ok()?;
        let minutes: f64 = caps["minutes"].parse().ok()?;
        let seconds: f64 = caps["seconds"].parse().ok()?;

        let total = days * SECONDS_PER_DAY + hours * 3600.0 + minutes * 60.0 + seconds;
        let negative = caps.name("sign").map_or(false, |m| m.as_str() == "-");
        Some(if negative { -total } else { total })
    }

    /// Classify a cell once into one of the time shapes.
    pub fn classify(&self, cell: &Cell) -> TimeValue {
        match cell {
            Cell::Text(text) if text.contains(':') => self
                .parse_duration(text)
                .map_or(TimeValue::Unrecognized, TimeValue::Duration),
            Cell::TimeOfDay(t) => TimeValue::TimeOfDay(*t),
            Cell::Duration(secs) => TimeValue::Duration(*secs),
            Cell::Number(v) => TimeValue::DayFraction(*v),
            _ => TimeValue::Unrecognized,
        }
    }

    /// Normalize a time cell to seconds.
    ///
    /// Unrecognized cells fall back to plain numeric coercion, so numeric
    /// text such as `"12.5"` is taken as seconds unchanged.
    pub fn normalize(&self, cell: &Cell) -> Option<f64> {
        match self.classify(cell) {
            TimeValue::Unrecognized => cell.coerce_numeric(),
            value => value.seconds(),
        }
    }
}
