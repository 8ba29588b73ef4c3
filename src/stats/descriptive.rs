use super::TestResult;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Arithmetic mean; NaN for an empty sample
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` degrees of freedom removed
///
/// NaN when the sample has `ddof` or fewer values.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - ddof) as f64).sqrt()
}

/// Percentile with linear interpolation between closest ranks (`q` in 0..=100)
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

pub(crate) fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Average ranks (1-based), ties share the mean of their positions
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let shared = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = shared;
        }
        i = j + 1;
    }
    ranks
}

/// Sizes of groups of tied values
pub(crate) fn tie_groups(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut groups = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        groups.push(j - i + 1);
        i = j + 1;
    }
    groups
}

/// Summary of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptive {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

impl Descriptive {
    pub fn from_sample(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            count: values.len(),
            mean: mean(values),
            median: percentile_sorted(&sorted, 50.0),
            std: std_dev(values, 1),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            max: sorted.last().copied().unwrap_or(f64::NAN),
            q25: percentile_sorted(&sorted, 25.0),
            q75: percentile_sorted(&sorted, 75.0),
        }
    }
}

/// Biased sample skewness `m3 / m2^1.5`
pub fn skewness(values: &[f64]) -> f64 {
    let (m2, m3, _) = central_moments(values);
    if m2 <= 0.0 {
        return if values.is_empty() { f64::NAN } else { 0.0 };
    }
    m3 / m2.powf(1.5)
}

/// Biased excess kurtosis `m4 / m2^2 - 3`
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let (m2, _, m4) = central_moments(values);
    if m2 <= 0.0 {
        return if values.is_empty() { f64::NAN } else { 0.0 };
    }
    m4 / m2.powi(2) - 3.0
}

fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let m = mean(values);
    values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), v| {
        let d = v - m;
        (m2 + d * d / n, m3 + d.powi(3) / n, m4 + d.powi(4) / n)
    })
}

/// Jarque–Bera normality test, `JB = n/6 (S² + K²/4)` against χ²(2)
pub fn jarque_bera(values: &[f64]) -> TestResult {
    if values.len() < 3 {
        return TestResult::undefined();
    }
    let n = values.len() as f64;
    let s = skewness(values);
    let k = excess_kurtosis(values);
    let statistic = n / 6.0 * (s * s + k * k / 4.0);
    let p_value = ChiSquared::new(2.0)
        .map(|chi| 1.0 - chi.cdf(statistic))
        .unwrap_or(f64::NAN);
    TestResult::new(statistic, p_value)
}

/// Shape of a return distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionShape {
    pub skewness: f64,
    pub excess_kurtosis: f64,
    pub jarque_bera: TestResult,
}

impl DistributionShape {
    pub fn from_sample(values: &[f64]) -> Self {
        Self {
            skewness: skewness(values),
            excess_kurtosis: excess_kurtosis(values),
            jarque_bera: jarque_bera(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_std() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(&x), 2.5);
        assert_relative_eq!(std_dev(&x, 1), 1.2909944487358056, epsilon = 1e-12);
        assert_relative_eq!(std_dev(&x, 0), 1.118033988749895, epsilon = 1e-12);
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[1.0], 1).is_nan());
    }

    #[test]
    fn test_percentile_linear() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&x, 50.0), 3.0);
        assert_relative_eq!(percentile(&x, 25.0), 2.0);
        assert_relative_eq!(percentile(&[1.0, 2.0], 50.0), 1.5);
        assert_relative_eq!(percentile(&x, 5.0), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
        assert_eq!(tie_groups(&[10.0, 20.0, 10.0, 30.0]), vec![2, 1, 1]);
    }

    #[test]
    fn test_descriptive() {
        let d = Descriptive::from_sample(&[3.0, 1.0, 2.0]);
        assert_eq!(d.count, 3);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 3.0);
        assert_eq!(d.median, 2.0);
    }

    #[test]
    fn test_symmetric_sample_has_zero_skew() {
        let x = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert_relative_eq!(skewness(&x), 0.0, epsilon = 1e-12);
        // uniform-ish sample is platykurtic
        assert!(excess_kurtosis(&x) < 0.0);
    }

    #[test]
    fn test_constant_sample_shape() {
        let x = [5.0; 10];
        assert_eq!(skewness(&x), 0.0);
        assert_eq!(excess_kurtosis(&x), 0.0);
    }

    #[test]
    fn test_jarque_bera_small_sample_undefined() {
        assert!(jarque_bera(&[1.0, 2.0]).p_value.is_nan());
    }
}
