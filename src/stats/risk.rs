use super::descriptive::{mean, percentile, std_dev};
use serde::{Deserialize, Serialize};

/// Annualized Sharpe ratio
///
/// `(mean - rf / ppy) / std(ddof=1) * sqrt(ppy)`. Zero for an empty sample or
/// when the standard deviation is zero or undefined.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let std = std_dev(returns, 1);
    if !std.is_finite() || std == 0.0 {
        return 0.0;
    }
    let excess = mean(returns) - risk_free_rate / periods_per_year;
    excess / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio
///
/// Downside deviation is the sample std of strictly negative returns.
/// `+inf` when there are no negative returns; zero when the downside
/// deviation is zero or undefined.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return f64::INFINITY;
    }
    let downside_std = std_dev(&downside, 1);
    if !downside_std.is_finite() || downside_std == 0.0 {
        return 0.0;
    }
    let excess = mean(returns) - risk_free_rate / periods_per_year;
    excess / downside_std * periods_per_year.sqrt()
}

/// Drawdown profile of the compounded return path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    /// Deepest peak-to-trough decline as a non-positive fraction
    pub max_drawdown: f64,
    /// Longest run of consecutive periods below a prior peak
    pub longest_duration: usize,
    /// Periods from the deepest trough back to its peak, `None` if never recovered
    pub recovery_periods: Option<usize>,
}

/// Drawdown over `cumprod(1 + r)` starting from a value of 1
///
/// A path that never declines has a max drawdown of exactly zero.
pub fn drawdown_stats(returns: &[f64]) -> DrawdownStats {
    let mut value = 1.0;
    let mut peak = 1.0;
    let mut max_drawdown = 0.0;
    let mut trough_idx = None;
    let mut trough_peak = 1.0;
    let mut current_run = 0;
    let mut longest_duration = 0;
    let mut path = Vec::with_capacity(returns.len());

    for (i, r) in returns.iter().enumerate() {
        value *= 1.0 + r;
        path.push(value);
        if value > peak {
            peak = value;
        }
        let dd = if peak > 0.0 { (value - peak) / peak } else { 0.0 };
        if dd < 0.0 {
            current_run += 1;
            longest_duration = longest_duration.max(current_run);
        } else {
            current_run = 0;
        }
        if dd < max_drawdown {
            max_drawdown = dd;
            trough_idx = Some(i);
            trough_peak = peak;
        }
    }

    let recovery_periods = trough_idx.and_then(|t| {
        path[t + 1..]
            .iter()
            .position(|v| *v >= trough_peak)
            .map(|offset| offset + 1)
    });

    DrawdownStats {
        max_drawdown,
        longest_duration,
        recovery_periods,
    }
}

/// Largest peak-to-trough decline of a value series, as a non-positive fraction
pub fn max_drawdown_of_values(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0;
    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Calmar ratio: annualized return over |max drawdown|
///
/// `mean_return` is the per-period return over a period of `years`. Zero when
/// the drawdown is zero.
pub fn calmar_ratio(mean_return: f64, years: f64, max_drawdown: f64) -> f64 {
    if max_drawdown == 0.0 || !max_drawdown.is_finite() || years <= 0.0 {
        return 0.0;
    }
    let growth = 1.0 + mean_return;
    let annualized = if growth > 0.0 {
        growth.powf(1.0 / years) - 1.0
    } else {
        -1.0
    };
    annualized / max_drawdown.abs()
}

/// Historical value at risk and conditional value at risk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
    pub confidence: f64,
    /// The `(1 - confidence)` percentile of returns
    pub var: f64,
    /// Mean of the returns at or below `var`
    pub cvar: f64,
}

pub fn value_at_risk(returns: &[f64], confidence: f64) -> TailRisk {
    let var = percentile(returns, (1.0 - confidence) * 100.0);
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    TailRisk {
        confidence,
        var,
        cvar: mean(&tail),
    }
}

/// Omega ratio: probability-weighted gains over losses relative to `threshold`
///
/// `+inf` with gains and no losses, zero with neither.
pub fn omega_ratio(returns: &[f64], threshold: f64) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    let gains: f64 = returns.iter().map(|r| (r - threshold).max(0.0)).sum();
    let losses: f64 = returns.iter().map(|r| (threshold - r).max(0.0)).sum();
    if losses > 0.0 {
        gains / losses
    } else if gains > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Ulcer index: RMS of percentage drawdowns along the compounded path
pub fn ulcer_index(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mut value = 1.0;
    let mut peak = 1.0;
    let mut sum_sq = 0.0;
    for r in returns {
        value *= 1.0 + r;
        peak = f64::max(peak, value);
        let dd_pct = if peak > 0.0 { (value - peak) / peak * 100.0 } else { 0.0 };
        sum_sq += dd_pct * dd_pct;
    }
    (sum_sq / returns.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sharpe() {
        let returns = [0.1, 0.2, 0.3];
        // mean 0.2, std 0.1, rf 0
        assert_relative_eq!(sharpe_ratio(&returns, 0.0, 1.0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(sharpe_ratio(&returns, 0.04, 4.0), (0.2 - 0.01) / 0.1 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_degenerate() {
        assert_eq!(sharpe_ratio(&[], 0.04, 1.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.1, 0.1], 0.0, 1.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.1], 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_sortino() {
        assert_eq!(sortino_ratio(&[0.1, 0.2], 0.0, 1.0), f64::INFINITY);
        assert_eq!(sortino_ratio(&[0.1, -0.2], 0.0, 1.0), 0.0); // single downside value
        let r = [0.3, -0.1, -0.3];
        let expected = (0.3 - 0.1 - 0.3) / 3.0 / std_dev(&[-0.1, -0.3], 1);
        assert_relative_eq!(sortino_ratio(&r, 0.0, 1.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_monotonic_path_has_zero_drawdown() {
        let stats = drawdown_stats(&[0.01, 0.05, 0.0, 0.2, 0.03]);
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.longest_duration, 0);
        assert_eq!(stats.recovery_periods, None);
    }

    #[test]
    fn test_drawdown_and_recovery() {
        // 1.0 → 1.1 → 0.88 → 0.968 → 1.1616
        let stats = drawdown_stats(&[0.1, -0.2, 0.1, 0.2]);
        assert_relative_eq!(stats.max_drawdown, -0.2, epsilon = 1e-12);
        assert_eq!(stats.longest_duration, 2);
        assert_eq!(stats.recovery_periods, Some(2));
    }

    #[test]
    fn test_drawdown_first_period_loss() {
        let stats = drawdown_stats(&[-0.5]);
        assert_relative_eq!(stats.max_drawdown, -0.5);
        assert_eq!(stats.recovery_periods, None);
    }

    #[test]
    fn test_max_drawdown_of_values() {
        assert_relative_eq!(max_drawdown_of_values(&[100.0, 120.0, 90.0, 130.0]), -0.25);
        assert_eq!(max_drawdown_of_values(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown_of_values(&[]), 0.0);
    }

    #[test]
    fn test_calmar() {
        assert_eq!(calmar_ratio(0.5, 2.0, 0.0), 0.0);
        let expected = (1.21f64.powf(0.5) - 1.0) / 0.1;
        assert_relative_eq!(calmar_ratio(0.21, 2.0, -0.1), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_var_cvar() {
        let returns: Vec<f64> = (1..=100).map(|i| i as f64 / 100.0 - 0.5).collect();
        let tail = value_at_risk(&returns, 0.95);
        assert_relative_eq!(tail.var, percentile(&returns, 5.0), epsilon = 1e-12);
        assert!(tail.cvar <= tail.var);
    }

    #[test]
    fn test_var_empty() {
        let tail = value_at_risk(&[], 0.95);
        assert!(tail.var.is_nan());
        assert!(tail.cvar.is_nan());
    }

    #[test]
    fn test_omega_and_ulcer() {
        assert_relative_eq!(omega_ratio(&[0.2, -0.1], 0.0), 2.0);
        assert_eq!(omega_ratio(&[0.2], 0.0), f64::INFINITY);
        assert_eq!(ulcer_index(&[0.1, 0.1]), 0.0);
        assert!(ulcer_index(&[0.1, -0.5]) > 0.0);
    }
}
