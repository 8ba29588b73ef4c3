use crate::models::WeeklyRecord;
use serde::{Deserialize, Serialize};

/// Whole-history scalars computed once and threaded through the signal stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub mean_return: f64,
    /// Population dispersion of weekly returns (the "sensitivity" constant)
    pub sensitivity: f64,
    pub min_return: f64,
    pub max_return: f64,
    pub valid_returns: usize,
}

impl GlobalStats {
    pub fn empty() -> Self {
        Self {
            mean_return: 0.0,
            sensitivity: 0.0,
            min_return: 0.0,
            max_return: 0.0,
            valid_returns: 0,
        }
    }
}

/// Compute the global sensitivity constant and return range
///
/// `sensitivity = sqrt(mean((r - mean_r)^2))` over rows with a defined return
/// and a positive close. With no valid returns everything is zero.
pub fn compute_sensitivity(history: &[WeeklyRecord]) -> GlobalStats {
    let returns: Vec<f64> = history
        .iter()
        .filter(|r| r.weekly_close.map_or(false, |c| c > 0.0))
        .filter_map(|r| r.weekly_return)
        .filter(|r| r.is_finite())
        .collect();

    if returns.is_empty() {
        return GlobalStats::empty();
    }

    let n = returns.len() as f64;
    let mean_return = returns.iter().sum::<f64>() / n;
    let sensitivity = (returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let min_return = returns.iter().copied().fold(f64::INFINITY, f64::min);
    let max_return = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    GlobalStats {
        mean_return,
        sensitivity,
        min_return,
        max_return,
        valid_returns: returns.len(),
    }
}
