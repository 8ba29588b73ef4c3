use crate::models::Window;
use crate::{DcaError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How evaluation windows are laid over the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Back-to-back windows with no gap and no overlap
    NonOverlapping,
    /// Windows advancing by a fixed step, overlapping when step < duration
    Rolling,
}

impl Default for SamplingMode {
    fn default() -> Self {
        SamplingMode::Rolling
    }
}

/// Window starting at `start` covering exactly `duration_weeks × 7` days
///
/// `None` when the end date falls outside the calendar range.
fn window_at(start: NaiveDate, duration_weeks: u32) -> Option<Window> {
    let end = start.checked_add_signed(Duration::days(duration_weeks as i64 * 7 - 1))?;
    Some(Window::new(start, end, duration_weeks))
}

fn check_positive(name: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(DcaError::Configuration(format!("{} must be at least 1", name)));
    }
    Ok(())
}

/// Consecutive windows tiling `[overall_start, overall_end]`
///
/// Each window ends the day before the next begins. Stops before a window
/// would run past `overall_end`.
pub fn non_overlapping_windows(
    overall_start: NaiveDate,
    overall_end: NaiveDate,
    duration_weeks: u32,
) -> Result<Vec<Window>> {
    rolling_windows(overall_start, overall_end, duration_weeks, duration_weeks)
}

/// Windows advancing by `step_weeks` until one would run past `overall_end`
pub fn rolling_windows(
    overall_start: NaiveDate,
    overall_end: NaiveDate,
    duration_weeks: u32,
    step_weeks: u32,
) -> Result<Vec<Window>> {
    check_positive("duration_weeks", duration_weeks)?;
    check_positive("step_weeks", step_weeks)?;

    let mut windows = Vec::new();
    let step = Duration::weeks(step_weeks as i64);
    let mut start = overall_start;
    while let Some(window) = window_at(start, duration_weeks) {
        if window.end_date > overall_end {
            break;
        }
        windows.push(window);
        start = match start.checked_add_signed(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(windows)
}

/// Generate windows for a sampling mode
pub fn sample_windows(
    mode: SamplingMode,
    overall_start: NaiveDate,
    overall_end: NaiveDate,
    duration_weeks: u32,
    step_weeks: u32,
) -> Result<Vec<Window>> {
    let windows = match mode {
        SamplingMode::NonOverlapping => {
            non_overlapping_windows(overall_start, overall_end, duration_weeks)?
        }
        SamplingMode::Rolling => {
            rolling_windows(overall_start, overall_end, duration_weeks, step_weeks)?
        }
    };
    tracing::debug!(
        "{:?} sampling: {} windows of {} weeks",
        mode,
        windows.len(),
        duration_weeks
    );
    Ok(windows)
}

/// Fraction of `a`'s span shared with `b`, counted in whole days
pub fn overlap_fraction(a: &Window, b: &Window) -> f64 {
    let shared_start = a.start_date.max(b.start_date);
    let shared_end = a.end_date.min(b.end_date);
    let shared_days = ((shared_end - shared_start).num_days() + 1).max(0);
    let span_days = a.duration_weeks as f64 * 7.0;
    if span_days <= 0.0 {
        return 0.0;
    }
    shared_days as f64 / span_days
}

/// Overlap between consecutive rolling windows, `max(0, 1 - step / duration)`
pub fn nominal_overlap(duration_weeks: u32, step_weeks: u32) -> f64 {
    if duration_weeks == 0 {
        return 0.0;
    }
    (1.0 - step_weeks as f64 / duration_weeks as f64).max(0.0)
}

/// Rough count of independent windows among `n` overlapping ones
pub fn effective_window_count(n: usize, duration_weeks: u32, step_weeks: u32) -> f64 {
    if n == 0 || duration_weeks == 0 {
        return 0.0;
    }
    let scale = (step_weeks as f64 / duration_weeks as f64).min(1.0);
    (n as f64 * scale).clamp(1.0, n as f64)
}
