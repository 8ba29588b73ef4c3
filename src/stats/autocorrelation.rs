use super::descriptive::mean;
use super::TestResult;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Lag-`k` sample autocorrelation
///
/// Zero when the series has no variance or is shorter than the lag.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if lag >= n {
        return 0.0;
    }
    let m = mean(values);
    let denom: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if denom == 0.0 {
        return 0.0;
    }
    let num: f64 = (lag..n)
        .map(|t| (values[t] - m) * (values[t - lag] - m))
        .sum();
    num / denom
}

/// Ljung–Box portmanteau test over lags `1..=lags`
///
/// `Q = n(n+2) Σ ρ_k² / (n-k)` against χ²(lags). Undefined unless the series
/// is longer than `lags + 1`.
pub fn ljung_box(values: &[f64], lags: usize) -> TestResult {
    let n = values.len();
    if lags == 0 || n <= lags + 1 {
        return TestResult::undefined();
    }
    let nf = n as f64;
    let q = nf
        * (nf + 2.0)
        * (1..=lags)
            .map(|k| autocorrelation(values, k).powi(2) / (nf - k as f64))
            .sum::<f64>();
    let p_value = ChiSquared::new(lags as f64)
        .map(|chi| 1.0 - chi.cdf(q))
        .unwrap_or(f64::NAN);
    TestResult::new(q, p_value)
}

/// Effective number of independent observations, `n / (1 + 2 Σ ρ_k)`
///
/// The sum runs over lags `1..=max_lag` and stops at the first non-positive
/// autocorrelation. The result is clamped to `[1, n]`.
pub fn effective_sample_size(values: &[f64], max_lag: usize) -> f64 {
    let n = values.len();
    if n < 2 {
        return n as f64;
    }
    let mut rho_sum = 0.0;
    for k in 1..=max_lag.min(n - 1) {
        let rho = autocorrelation(values, k);
        if rho <= 0.0 {
            break;
        }
        rho_sum += rho;
    }
    (n as f64 / (1.0 + 2.0 * rho_sum)).clamp(1.0, n as f64)
}
