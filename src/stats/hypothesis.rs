use super::descriptive::{average_ranks, mean, std_dev, tie_groups};
use super::TestResult;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, ContinuousCDF, DiscreteCDF, Normal, StudentsT};

/// Alternative hypothesis for one- or two-sided tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alternative {
    TwoSided,
    /// First sample tends to be larger
    Greater,
    Less,
}

fn normal_cdf(z: f64) -> f64 {
    Normal::new(0.0, 1.0).map(|n| n.cdf(z)).unwrap_or(f64::NAN)
}

fn student_t_two_sided(t: f64, dof: f64) -> f64 {
    StudentsT::new(0.0, 1.0, dof)
        .map(|dist| 2.0 * (1.0 - dist.cdf(t.abs())))
        .unwrap_or(f64::NAN)
        .min(1.0)
}

/// Map a t statistic whose standard error collapsed to zero
fn degenerate_t(mean_difference: f64) -> TestResult {
    if mean_difference == 0.0 {
        TestResult::null()
    } else {
        TestResult::new(f64::INFINITY.copysign(mean_difference), 0.0)
    }
}

fn differences(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Paired Student t-test on `a - b`
///
/// Undefined below two pairs. Identical samples give `t = 0, p = 1`; a
/// constant non-zero difference gives `t = ±inf, p = 0`.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> TestResult {
    let diffs = differences(a, b);
    let n = diffs.len();
    if n < 2 {
        return TestResult::undefined();
    }
    let mean_diff = mean(&diffs);
    let std = std_dev(&diffs, 1);
    if std == 0.0 {
        return degenerate_t(mean_diff);
    }
    let t = mean_diff / (std / (n as f64).sqrt());
    TestResult::new(t, student_t_two_sided(t, (n - 1) as f64))
}

/// Two-sample Student t-test with pooled variance
pub fn independent_t_test(a: &[f64], b: &[f64]) -> TestResult {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return TestResult::undefined();
    }
    let dof = (n1 + n2 - 2) as f64;
    let pooled_var = ((n1 - 1) as f64 * std_dev(a, 1).powi(2)
        + (n2 - 1) as f64 * std_dev(b, 1).powi(2))
        / dof;
    let se = (pooled_var * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    let mean_diff = mean(a) - mean(b);
    if se == 0.0 {
        return degenerate_t(mean_diff);
    }
    let t = mean_diff / se;
    TestResult::new(t, student_t_two_sided(t, dof))
}

/// Wilcoxon signed-rank test (normal approximation with tie correction)
///
/// Zero differences are discarded. When every difference is zero the samples
/// are identical and the result is `statistic 0, p = 1`.
pub fn wilcoxon_signed_rank(a: &[f64], b: &[f64]) -> TestResult {
    let diffs: Vec<f64> = differences(a, b).into_iter().filter(|d| *d != 0.0).collect();
    if diffs.is_empty() {
        return if a.is_empty() {
            TestResult::undefined()
        } else {
            TestResult::null()
        };
    }

    let abs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&abs);
    let w_plus: f64 = diffs
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let n = diffs.len() as f64;
    let w_minus = n * (n + 1.0) / 2.0 - w_plus;
    let statistic = w_plus.min(w_minus);

    let expected = n * (n + 1.0) / 4.0;
    let tie_term: f64 = tie_groups(&abs)
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let variance = n * (n + 1.0) * (2.0 * n + 1.0) / 24.0 - tie_term / 48.0;
    if variance <= 0.0 {
        return TestResult::new(statistic, 1.0);
    }
    let z = (statistic - expected) / variance.sqrt();
    let p_value = (2.0 * normal_cdf(-z.abs())).min(1.0);
    TestResult::new(statistic, p_value)
}

/// Exact binomial sign test on the number of positive vs negative differences
///
/// Ties are dropped; with no non-zero pairs the p-value is 1.
pub fn sign_test(a: &[f64], b: &[f64]) -> TestResult {
    let diffs = differences(a, b);
    let positive = diffs.iter().filter(|d| **d > 0.0).count() as u64;
    let negative = diffs.iter().filter(|d| **d < 0.0).count() as u64;
    let n = positive + negative;
    if n == 0 {
        return TestResult::new(0.0, 1.0);
    }
    let k = positive.min(negative);
    let p_value = Binomial::new(0.5, n)
        .map(|dist| (2.0 * dist.cdf(k)).min(1.0))
        .unwrap_or(f64::NAN);
    TestResult::new(positive as f64, p_value)
}

/// Mann–Whitney U test (normal approximation, continuity and tie corrected)
///
/// The statistic is U for the first sample. When all values are tied the
/// p-value is 1.
pub fn mann_whitney_u(a: &[f64], b: &[f64], alternative: Alternative) -> TestResult {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return TestResult::undefined();
    }
    let combined: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranks = average_ranks(&combined);
    let rank_sum_a: f64 = ranks[..n1].iter().sum();

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let u1 = rank_sum_a - n1f * (n1f + 1.0) / 2.0;
    let mu = n1f * n2f / 2.0;

    let n = n1f + n2f;
    let tie_term: f64 = tie_groups(&combined)
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let sigma = (n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if sigma.is_nan() || sigma <= 0.0 {
        return TestResult::new(u1, 1.0);
    }

    let p_value = match alternative {
        Alternative::Greater => 1.0 - normal_cdf((u1 - mu - 0.5) / sigma),
        Alternative::Less => normal_cdf((u1 - mu + 0.5) / sigma),
        Alternative::TwoSided => {
            let z = ((u1 - mu).abs() - 0.5).max(0.0) / sigma;
            (2.0 * (1.0 - normal_cdf(z))).min(1.0)
        }
    };
    TestResult::new(u1, p_value)
}

/// Cohen's d for paired samples: mean difference over std of differences
///
/// Zero when the differences have no spread or fewer than two pairs.
pub fn cohens_d_paired(a: &[f64], b: &[f64]) -> f64 {
    let diffs = differences(a, b);
    let std = std_dev(&diffs, 1);
    if !std.is_finite() || std == 0.0 {
        return 0.0;
    }
    mean(&diffs) / std
}

/// Cohen's d for independent samples using the pooled standard deviation
pub fn cohens_d_pooled(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return 0.0;
    }
    let pooled = (((n1 - 1) as f64 * std_dev(a, 1).powi(2)
        + (n2 - 1) as f64 * std_dev(b, 1).powi(2))
        / (n1 + n2 - 2) as f64)
        .sqrt();
    if pooled == 0.0 {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled
}

/// Two-sided standard normal critical value for `confidence` (1.96 at 0.95)
///
/// NaN when `confidence` is outside (0, 1).
pub fn two_sided_z(confidence: f64) -> f64 {
    if !(confidence > 0.0 && confidence < 1.0) {
        return f64::NAN;
    }
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(0.5 + confidence / 2.0))
        .unwrap_or(f64::NAN)
}

/// Normal-approximation interval for the mean paired difference
///
/// Returns `(mean, lower, upper)` using `z × std / sqrt(n)`.
pub fn mean_difference_ci(a: &[f64], b: &[f64], z: f64) -> (f64, f64, f64) {
    let diffs = differences(a, b);
    let m = mean(&diffs);
    let se = std_dev(&diffs, 1) / (diffs.len() as f64).sqrt();
    if !se.is_finite() {
        return (m, f64::NAN, f64::NAN);
    }
    (m, m - z * se, m + z * se)
}
