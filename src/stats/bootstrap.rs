use super::descriptive::percentile_sorted;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Point estimate with a percentile bootstrap interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

impl ConfidenceInterval {
    pub fn undefined(confidence: f64) -> Self {
        Self {
            point: f64::NAN,
            lower: f64::NAN,
            upper: f64::NAN,
            confidence,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Default moving-block length, `ceil(n^(1/3))`
pub fn default_block_length(n: usize) -> usize {
    ((n as f64).cbrt().ceil() as usize).max(1)
}

/// Percentile bootstrap interval for any scalar statistic
///
/// # Arguments
/// * `data` - Sample to resample with replacement
/// * `statistic` - Statistic evaluated on each resample
/// * `n_bootstrap` - Number of resamples
/// * `confidence` - Interval coverage, e.g. 0.95
/// * `seed` - Base seed; resample `i` uses `seed + i`, so results do not depend
///   on thread scheduling
pub fn bootstrap_ci<F>(
    data: &[f64],
    statistic: F,
    n_bootstrap: usize,
    confidence: f64,
    seed: u64,
) -> ConfidenceInterval
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    resample_ci(data, &statistic, n_bootstrap, confidence, |rng, n| {
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }, seed)
}

/// Moving-block bootstrap interval for autocorrelated samples
///
/// Blocks of `block_length` consecutive values (default `ceil(n^(1/3))`) are
/// drawn with replacement and concatenated until the resample reaches `n`.
pub fn block_bootstrap_ci<F>(
    data: &[f64],
    statistic: F,
    block_length: Option<usize>,
    n_bootstrap: usize,
    confidence: f64,
    seed: u64,
) -> ConfidenceInterval
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    let block = block_length
        .unwrap_or_else(|| default_block_length(data.len()))
        .clamp(1, data.len().max(1));

    resample_ci(data, &statistic, n_bootstrap, confidence, move |rng, n| {
        let mut indices = Vec::with_capacity(n + block);
        while indices.len() < n {
            let start = rng.gen_range(0..=n - block);
            indices.extend(start..start + block);
        }
        indices.truncate(n);
        indices
    }, seed)
}

fn resample_ci<F, S>(
    data: &[f64],
    statistic: &F,
    n_bootstrap: usize,
    confidence: f64,
    sampler: S,
    seed: u64,
) -> ConfidenceInterval
where
    F: Fn(&[f64]) -> f64 + Sync,
    S: Fn(&mut StdRng, usize) -> Vec<usize> + Sync,
{
    if data.is_empty() {
        return ConfidenceInterval::undefined(confidence);
    }
    let point = statistic(data);
    if n_bootstrap == 0 {
        return ConfidenceInterval {
            point,
            lower: point,
            upper: point,
            confidence,
        };
    }

    let n = data.len();
    let mut estimates: Vec<f64> = (0..n_bootstrap)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let sample: Vec<f64> = sampler(&mut rng, n).into_iter().map(|j| data[j]).collect();
            statistic(&sample)
        })
        .filter(|v| !v.is_nan())
        .collect();

    if estimates.is_empty() {
        return ConfidenceInterval {
            point,
            ..ConfidenceInterval::undefined(confidence)
        };
    }

    estimates.sort_by(f64::total_cmp);
    let alpha = (1.0 - confidence) / 2.0;
    ConfidenceInterval {
        point,
        lower: percentile_sorted(&estimates, alpha * 100.0),
        upper: percentile_sorted(&estimates, (1.0 - alpha) * 100.0),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::descriptive::mean;

    fn sample() -> Vec<f64> {
        (0..50).map(|i| (i as f64 * 0.37).sin()).collect()
    }

    #[test]
    fn test_bootstrap_is_seeded() {
        let data = sample();
        let a = bootstrap_ci(&data, mean, 500, 0.95, 7);
        let b = bootstrap_ci(&data, mean, 500, 0.95, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bootstrap_brackets_point() {
        let data = sample();
        let ci = bootstrap_ci(&data, mean, 1000, 0.95, 42);
        assert!(ci.lower <= ci.point && ci.point <= ci.upper);
        assert!(ci.width() > 0.0);
    }

    #[test]
    fn test_constant_sample_collapses() {
        let data = vec![0.5; 20];
        let ci = bootstrap_ci(&data, mean, 200, 0.95, 1);
        assert_eq!(ci.lower, 0.5);
        assert_eq!(ci.upper, 0.5);
    }

    #[test]
    fn test_empty_sample() {
        let ci = bootstrap_ci(&[], mean, 100, 0.95, 1);
        assert!(ci.point.is_nan());
    }

    #[test]
    fn test_block_bootstrap() {
        let data = sample();
        assert_eq!(default_block_length(50), 4);
        assert_eq!(default_block_length(0), 1);
        let ci = block_bootstrap_ci(&data, mean, None, 500, 0.9, 3);
        assert!(ci.lower <= ci.upper);
        assert_eq!(ci, block_bootstrap_ci(&data, mean, None, 500, 0.9, 3));
    }

    #[test]
    fn test_block_longer_than_sample() {
        let data = vec![1.0, 2.0];
        let ci = block_bootstrap_ci(&data, mean, Some(10), 50, 0.95, 3);
        // a single block covering everything reproduces the sample
        assert_eq!(ci.lower, 1.5);
        assert_eq!(ci.upper, 1.5);
    }
}
