// Statistical toolkit for comparing strategy outcomes across windows
//
// Every function degrades on empty or degenerate input by returning 0, NaN
// or ±inf according to its documented rule; none of them panic.

pub mod autocorrelation;
pub mod bootstrap;
pub mod correction;
pub mod correlation;
pub mod descriptive;
pub mod hypothesis;
pub mod risk;

pub use autocorrelation::{autocorrelation, effective_sample_size, ljung_box};
pub use bootstrap::{block_bootstrap_ci, bootstrap_ci, default_block_length, ConfidenceInterval};
pub use correction::CorrectionMethod;
pub use correlation::{linear_fit, pearson, spearman, LinearFit};
pub use descriptive::{
    excess_kurtosis, jarque_bera, mean, median, percentile, skewness, std_dev, Descriptive,
    DistributionShape,
};
pub use hypothesis::{
    cohens_d_paired, cohens_d_pooled, independent_t_test, mann_whitney_u,
    mean_difference_ci, paired_t_test, sign_test, two_sided_z, wilcoxon_signed_rank,
    Alternative,
};
pub use risk::{
    calmar_ratio, drawdown_stats, max_drawdown_of_values, omega_ratio, sharpe_ratio,
    sortino_ratio, ulcer_index, value_at_risk, DrawdownStats, TailRisk,
};

use serde::{Deserialize, Serialize};

/// Test statistic and p-value of a hypothesis test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self { statistic, p_value }
    }

    /// Not enough data to run the test
    pub fn undefined() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    /// No evidence at all against the null (e.g. identical samples)
    pub fn null() -> Self {
        Self::new(0.0, 1.0)
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_finite() && self.p_value < alpha
    }
}
