use super::windows::{effective_window_count, nominal_overlap};
use crate::models::StrategyOutcome;
use crate::stats::{
    self, block_bootstrap_ci, bootstrap_ci, calmar_ratio, cohens_d_paired, cohens_d_pooled,
    drawdown_stats, independent_t_test, linear_fit, ljung_box, mann_whitney_u, mean,
    mean_difference_ci, omega_ratio, paired_t_test, pearson, sharpe_ratio, sign_test,
    sortino_ratio, spearman, std_dev, two_sided_z, ulcer_index, value_at_risk,
    wilcoxon_signed_rank, Alternative, ConfidenceInterval, Descriptive, DistributionShape, DrawdownStats, LinearFit,
    TailRisk, TestResult,
};
use serde::{Deserialize, Serialize};

/// Knobs for the cross-window statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonParams {
    pub risk_free_rate: f64,
    pub confidence: f64,
    pub n_bootstrap: usize,
    pub seed: u64,
    pub autocorrelation_lags: usize,
}

impl Default for ComparisonParams {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04, // annual
            confidence: 0.95,
            n_bootstrap: 2000,
            seed: 42,
            autocorrelation_lags: 5,
        }
    }
}

/// Cross-window statistics for one strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: String,
    /// Window returns as fractions
    pub returns: Descriptive,
    pub mean_units: f64,
    pub mean_net_invested: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub drawdown: DrawdownStats,
    pub calmar_ratio: f64,
    pub tail_risk: TailRisk,
    pub omega_ratio: f64,
    pub ulcer_index: f64,
    pub mean_return_ci: ConfidenceInterval,
    pub distribution: DistributionShape,
}

impl StrategySummary {
    fn from_outcomes(
        strategy: &str,
        outcomes: &[&StrategyOutcome],
        returns: &[f64],
        years: f64,
        overlapping: bool,
        params: &ComparisonParams,
    ) -> Self {
        let ppy = if years > 0.0 { 1.0 / years } else { 1.0 };
        let drawdown = drawdown_stats(returns);
        let mean_return = mean(returns);
        let mean_return_ci = if overlapping {
            block_bootstrap_ci(returns, mean, None, params.n_bootstrap, params.confidence, params.seed)
        } else {
            bootstrap_ci(returns, mean, params.n_bootstrap, params.confidence, params.seed)
        };
        let units: Vec<f64> = outcomes.iter().map(|o| o.total_units).collect();
        let invested: Vec<f64> = outcomes.iter().map(|o| o.net_invested).collect();

        Self {
            strategy: strategy.to_string(),
            returns: Descriptive::from_sample(returns),
            mean_units: mean(&units),
            mean_net_invested: mean(&invested),
            win_rate: share(returns.iter().filter(|r| **r > 0.0).count(), returns.len()),
            sharpe_ratio: sharpe_ratio(returns, params.risk_free_rate, ppy),
            sortino_ratio: sortino_ratio(returns, params.risk_free_rate, ppy),
            drawdown,
            calmar_ratio: if returns.is_empty() {
                0.0
            } else {
                calmar_ratio(mean_return, years, drawdown.max_drawdown)
            },
            tail_risk: value_at_risk(returns, params.confidence),
            omega_ratio: omega_ratio(returns, 0.0),
            ulcer_index: ulcer_index(returns),
            mean_return_ci,
            distribution: DistributionShape::from_sample(returns),
        }
    }
}

/// Paired statistics on Optimum minus Simple window returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairedComparison {
    pub pairs: usize,
    pub mean_difference: f64,
    pub median_difference: f64,
    /// Normal-approximation interval, `mean ± z × se` at the configured confidence
    pub difference_ci: ConfidenceInterval,
    pub difference_bootstrap_ci: ConfidenceInterval,

    // Significance
    pub paired_t: TestResult,
    pub wilcoxon: TestResult,
    pub sign_test: TestResult,
    pub cohens_d: f64,
    pub independent_t: TestResult,
    /// One-sided: Optimum returns tend to be larger
    pub mann_whitney: TestResult,
    pub cohens_d_pooled: f64,
    /// Paired t p-value after multiple-comparison correction, set by the sweep
    pub adjusted_p_value: Option<f64>,

    // Head to head
    pub optimum_wins: usize,
    pub simple_wins: usize,
    pub ties: usize,
    pub win_rate: f64,
    pub outperformance_pp: f64,
    pub outperformance_ratio: f64,
    pub units_ratio: f64,

    // Dependence
    pub pearson: f64,
    pub spearman: f64,
    pub fit: LinearFit,
    pub tracking_error: f64,
    pub information_ratio: f64,

    // Consistency
    pub longest_optimum_streak: usize,
    pub longest_simple_streak: usize,
    pub regime_changes: usize,

    // Autocorrelation of the difference series
    pub lag1_autocorrelation: f64,
    pub ljung_box: TestResult,
    pub effective_sample_size: f64,
}

impl PairedComparison {
    fn from_pairs(
        optimum: &[f64],
        simple: &[f64],
        units_ratio: f64,
        overlapping: bool,
        params: &ComparisonParams,
    ) -> Self {
        let diffs: Vec<f64> = optimum.iter().zip(simple).map(|(a, b)| a - b).collect();
        let n = diffs.len();

        let z = two_sided_z(params.confidence);
        let (mean_difference, lo, hi) = mean_difference_ci(optimum, simple, z);
        let difference_bootstrap_ci = if overlapping {
            block_bootstrap_ci(&diffs, mean, None, params.n_bootstrap, params.confidence, params.seed)
        } else {
            bootstrap_ci(&diffs, mean, params.n_bootstrap, params.confidence, params.seed)
        };

        let optimum_wins = diffs.iter().filter(|d| **d > 0.0).count();
        let simple_wins = diffs.iter().filter(|d| **d < 0.0).count();
        let (longest_optimum_streak, longest_simple_streak, regime_changes) = consistency(&diffs);

        let tracking_error = std_dev(&diffs, 1);
        let information_ratio = if tracking_error.is_finite() && tracking_error > 0.0 {
            mean_difference / tracking_error
        } else {
            0.0
        };

        let simple_mean = mean(simple);
        let outperformance_ratio = if simple_mean != 0.0 {
            mean(optimum) / simple_mean
        } else {
            f64::NAN
        };

        Self {
            pairs: n,
            mean_difference,
            median_difference: stats::median(&diffs),
            difference_ci: ConfidenceInterval {
                point: mean_difference,
                lower: lo,
                upper: hi,
                confidence: params.confidence,
            },
            difference_bootstrap_ci,
            paired_t: paired_t_test(optimum, simple),
            wilcoxon: wilcoxon_signed_rank(optimum, simple),
            sign_test: sign_test(optimum, simple),
            cohens_d: cohens_d_paired(optimum, simple),
            independent_t: independent_t_test(optimum, simple),
            mann_whitney: mann_whitney_u(optimum, simple, Alternative::Greater),
            cohens_d_pooled: cohens_d_pooled(optimum, simple),
            adjusted_p_value: None,
            optimum_wins,
            simple_wins,
            ties: n - optimum_wins - simple_wins,
            win_rate: share(optimum_wins, n),
            outperformance_pp: mean_difference * 100.0,
            outperformance_ratio,
            units_ratio,
            pearson: pearson(optimum, simple),
            spearman: spearman(optimum, simple),
            fit: linear_fit(simple, optimum),
            tracking_error,
            information_ratio,
            longest_optimum_streak,
            longest_simple_streak,
            regime_changes,
            lag1_autocorrelation: stats::autocorrelation(&diffs, 1),
            ljung_box: ljung_box(&diffs, params.autocorrelation_lags),
            effective_sample_size: stats::effective_sample_size(&diffs, params.autocorrelation_lags),
        }
    }
}

/// Longest winning streaks for each side and the number of leader changes
fn consistency(diffs: &[f64]) -> (usize, usize, usize) {
    let mut best = (0, 0);
    let mut run = 0usize;
    let mut leader = 0i8;
    let mut changes = 0;

    for d in diffs {
        let sign = if *d > 0.0 {
            1
        } else if *d < 0.0 {
            -1
        } else {
            0
        };
        if sign == 0 {
            run = 0;
            continue;
        }
        if sign == leader {
            run += 1;
        } else {
            if leader != 0 {
                changes += 1;
            }
            leader = sign;
            run = 1;
        }
        if sign > 0 {
            best.0 = best.0.max(run);
        } else {
            best.1 = best.1.max(run);
        }
    }
    (best.0, best.1, changes)
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Cross-window comparison of Optimum vs Simple DCA for one duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub duration_weeks: u32,
    pub windows: usize,
    /// Windows where both strategies had a defined return
    pub paired_windows: usize,
    pub nominal_overlap: f64,
    pub effective_windows: f64,
    pub optimum: StrategySummary,
    pub simple: StrategySummary,
    pub comparison: PairedComparison,
}

impl ComparisonResult {
    /// Build from `(optimum, simple)` outcome pairs in window order
    ///
    /// # Arguments
    /// * `duration_weeks` - Window length, used to annualize ratios
    /// * `step_weeks` - Step between window starts; a step shorter than the
    ///   duration switches the bootstrap to moving blocks
    /// * `pairs` - One outcome pair per window
    /// * `params` - Risk-free rate, confidence, bootstrap settings
    pub fn from_outcomes(
        duration_weeks: u32,
        step_weeks: u32,
        pairs: &[(StrategyOutcome, StrategyOutcome)],
        params: &ComparisonParams,
    ) -> Self {
        let defined: Vec<(&StrategyOutcome, &StrategyOutcome, f64, f64)> = pairs
            .iter()
            .filter_map(|(o, s)| Some((o, s, o.return_fraction()?, s.return_fraction()?)))
            .collect();

        let optimum_outcomes: Vec<&StrategyOutcome> = defined.iter().map(|d| d.0).collect();
        let simple_outcomes: Vec<&StrategyOutcome> = defined.iter().map(|d| d.1).collect();
        let optimum_returns: Vec<f64> = defined.iter().map(|d| d.2).collect();
        let simple_returns: Vec<f64> = defined.iter().map(|d| d.3).collect();

        let years = duration_weeks as f64 * 7.0 / 365.25;
        let overlapping = step_weeks < duration_weeks;

        let optimum_units = mean(&optimum_outcomes.iter().map(|o| o.total_units).collect::<Vec<_>>());
        let simple_units = mean(&simple_outcomes.iter().map(|o| o.total_units).collect::<Vec<_>>());
        let units_ratio = if simple_units > 0.0 {
            optimum_units / simple_units
        } else {
            f64::NAN
        };

        let optimum_name = pairs
            .first()
            .map_or("Optimum DCA", |(o, _)| o.strategy.as_str());
        let simple_name = pairs
            .first()
            .map_or("Simple DCA", |(_, s)| s.strategy.as_str());

        Self {
            duration_weeks,
            windows: pairs.len(),
            paired_windows: defined.len(),
            nominal_overlap: nominal_overlap(duration_weeks, step_weeks),
            effective_windows: effective_window_count(defined.len(), duration_weeks, step_weeks),
            optimum: StrategySummary::from_outcomes(
                optimum_name,
                &optimum_outcomes,
                &optimum_returns,
                years,
                overlapping,
                params,
            ),
            simple: StrategySummary::from_outcomes(
                simple_name,
                &simple_outcomes,
                &simple_returns,
                years,
                overlapping,
                params,
            ),
            comparison: PairedComparison::from_pairs(
                &optimum_returns,
                &simple_returns,
                units_ratio,
                overlapping,
                params,
            ),
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        let c = &self.comparison;
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║  {:<53}║", format!("{}-WEEK WINDOW COMPARISON", self.duration_weeks));
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!(
            "  Windows: {} ({} paired, overlap {:.0}%, ~{:.1} independent)",
            self.windows,
            self.paired_windows,
            self.nominal_overlap * 100.0,
            self.effective_windows
        );

        println!(
            "\n{:<22} {:>15} {:>15}",
            "", self.optimum.strategy, self.simple.strategy
        );
        println!("{}", "─".repeat(54));
        let rows: [(&str, f64, f64, bool); 8] = [
            ("Mean return", self.optimum.returns.mean, self.simple.returns.mean, true),
            ("Median return", self.optimum.returns.median, self.simple.returns.median, true),
            ("Std dev", self.optimum.returns.std, self.simple.returns.std, true),
            ("Win rate", self.optimum.win_rate, self.simple.win_rate, true),
            ("Sharpe", self.optimum.sharpe_ratio, self.simple.sharpe_ratio, false),
            ("Sortino", self.optimum.sortino_ratio, self.simple.sortino_ratio, false),
            ("Calmar", self.optimum.calmar_ratio, self.simple.calmar_ratio, false),
            (
                "Max drawdown",
                self.optimum.drawdown.max_drawdown,
                self.simple.drawdown.max_drawdown,
                true,
            ),
        ];
        for (label, a, b, as_pct) in rows {
            if as_pct {
                println!("{:<22} {:>14.2}% {:>14.2}%", label, a * 100.0, b * 100.0);
            } else {
                println!("{:<22} {:>15.3} {:>15.3}", label, a, b);
            }
        }

        println!("\n🔬 PAIRED TESTS (Optimum − Simple)");
        println!(
            "  Mean difference:       {:+.2}pp  [{:+.2}, {:+.2}]",
            c.outperformance_pp,
            c.difference_bootstrap_ci.lower * 100.0,
            c.difference_bootstrap_ci.upper * 100.0
        );
        println!(
            "  Paired t:              t={:.3}  p={:.4}",
            c.paired_t.statistic, c.paired_t.p_value
        );
        if let Some(adj) = c.adjusted_p_value {
            println!("  Adjusted p:            {:.4}", adj);
        }
        println!("  Wilcoxon:              p={:.4}", c.wilcoxon.p_value);
        println!("  Sign test:             p={:.4}", c.sign_test.p_value);
        println!("  Cohen's d:             {:.3}", c.cohens_d);
        println!(
            "  Optimum wins:          {}/{} ({:.1}%)",
            c.optimum_wins,
            c.pairs,
            c.win_rate * 100.0
        );
        println!("  Units ratio:           {:.2}x", c.units_ratio);
        println!(
            "  Lag-1 autocorrelation: {:.3} (n_eff ≈ {:.1})",
            c.lag1_autocorrelation, c.effective_sample_size
        );

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}
