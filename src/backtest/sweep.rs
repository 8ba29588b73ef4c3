use super::comparison::{ComparisonParams, ComparisonResult};
use super::runner::BacktestRunner;
use super::table::WeeklyTable;
use super::windows::{sample_windows, SamplingMode};
use crate::data::PriceSeries;
use crate::models::{StrategyOutcome, Window};
use crate::stats::{mean, CorrectionMethod, Descriptive};
use crate::Result;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// What to sweep and how to compare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepParams {
    pub overall_start: NaiveDate,
    pub overall_end: NaiveDate,
    pub durations_weeks: Vec<u32>,
    pub sampling: SamplingMode,
    pub rolling_step_weeks: u32,
    pub correction: CorrectionMethod,
    pub comparison: ComparisonParams,
}

impl SweepParams {
    fn step_for(&self, duration_weeks: u32) -> u32 {
        match self.sampling {
            SamplingMode::NonOverlapping => duration_weeks,
            SamplingMode::Rolling => self.rolling_step_weeks,
        }
    }
}

/// Both strategies' outcomes for one window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowOutcome {
    pub window: Window,
    pub optimum: StrategyOutcome,
    pub simple: StrategyOutcome,
}

/// All windows and statistics for one duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationReport {
    pub duration_weeks: u32,
    pub step_weeks: u32,
    pub skipped_windows: usize,
    pub windows: Vec<WindowOutcome>,
    pub comparison: ComparisonResult,
}

/// Pooled view over every window of every duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendedSummary {
    pub total_windows: usize,
    pub optimum: Descriptive,
    pub simple: Descriptive,
    pub win_rate: f64,
    pub outperformance_pp: f64,
    /// Mean Optimum return over mean Simple return
    pub times_better: f64,
    /// Mean of per-window Optimum / Simple return ratios
    pub average_ratio: f64,
}

impl BlendedSummary {
    fn from_reports(reports: &[DurationReport]) -> Self {
        let pairs: Vec<(f64, f64)> = reports
            .iter()
            .flat_map(|r| &r.windows)
            .filter_map(|w| Some((w.optimum.return_fraction()?, w.simple.return_fraction()?)))
            .collect();

        let optimum: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let simple: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let wins = pairs.iter().filter(|(o, s)| o > s).count();
        let ratios: Vec<f64> = pairs
            .iter()
            .filter(|(_, s)| *s != 0.0)
            .map(|(o, s)| o / s)
            .collect();

        let simple_mean = mean(&simple);
        Self {
            total_windows: pairs.len(),
            optimum: Descriptive::from_sample(&optimum),
            simple: Descriptive::from_sample(&simple),
            win_rate: if pairs.is_empty() {
                0.0
            } else {
                wins as f64 / pairs.len() as f64
            },
            outperformance_pp: (mean(&optimum) - simple_mean) * 100.0,
            times_better: if simple_mean != 0.0 {
                mean(&optimum) / simple_mean
            } else {
                f64::NAN
            },
            average_ratio: mean(&ratios),
        }
    }
}

/// Full sweep output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub correction: CorrectionMethod,
    pub durations: Vec<DurationReport>,
    pub blended: BlendedSummary,
}

/// Run both strategies over every sampled window of every duration
///
/// Windows are simulated in parallel and collected in window order, so the
/// report is identical across thread counts. A window whose simulation fails
/// is logged and skipped. Paired t p-values are corrected across durations.
pub fn run_duration_sweep(
    runner: &BacktestRunner,
    table: &WeeklyTable,
    series: &PriceSeries,
    params: &SweepParams,
) -> Result<SweepReport> {
    let mut durations = Vec::with_capacity(params.durations_weeks.len());

    for &duration_weeks in &params.durations_weeks {
        let step_weeks = params.step_for(duration_weeks);
        let windows = sample_windows(
            params.sampling,
            params.overall_start,
            params.overall_end,
            duration_weeks,
            step_weeks,
        )?;

        if windows.is_empty() {
            tracing::warn!(
                "⚠️  No {}-week windows fit between {} and {}, skipping",
                duration_weeks,
                params.overall_start,
                params.overall_end
            );
            continue;
        }

        tracing::info!(
            "🔄 Simulating {} windows of {} weeks (step {})",
            windows.len(),
            duration_weeks,
            step_weeks
        );

        let results: Vec<_> = windows
            .par_iter()
            .map(|window| (*window, runner.run_pair(table, series, window)))
            .collect();

        let mut outcomes = Vec::with_capacity(results.len());
        let mut skipped_windows = 0;
        for (window, result) in results {
            match result {
                Ok(pair) => outcomes.push(WindowOutcome {
                    window,
                    optimum: pair.optimum.outcome,
                    simple: pair.simple.outcome,
                }),
                Err(e) => {
                    skipped_windows += 1;
                    tracing::warn!("⚠️  Window {} failed: {}", window, e);
                }
            }
        }

        let pairs: Vec<(StrategyOutcome, StrategyOutcome)> = outcomes
            .iter()
            .map(|w| (w.optimum.clone(), w.simple.clone()))
            .collect();
        let comparison =
            ComparisonResult::from_outcomes(duration_weeks, step_weeks, &pairs, &params.comparison);

        tracing::info!(
            "✅ {}w: optimum {:+.2}% vs simple {:+.2}% (p={:.4})",
            duration_weeks,
            comparison.optimum.returns.mean * 100.0,
            comparison.simple.returns.mean * 100.0,
            comparison.comparison.paired_t.p_value
        );

        durations.push(DurationReport {
            duration_weeks,
            step_weeks,
            skipped_windows,
            windows: outcomes,
            comparison,
        });
    }

    let p_values: Vec<f64> = durations
        .iter()
        .map(|d| d.comparison.comparison.paired_t.p_value)
        .collect();
    let adjusted = params.correction.adjust(&p_values);
    for (report, p) in durations.iter_mut().zip(adjusted) {
        report.comparison.comparison.adjusted_p_value = if p.is_nan() { None } else { Some(p) };
    }

    let blended = BlendedSummary::from_reports(&durations);
    Ok(SweepReport {
        correction: params.correction,
        durations,
        blended,
    })
}

impl SweepReport {
    /// Print one row per duration plus the blended summary
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              DURATION SWEEP SUMMARY                   ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!(
            "{:<10} {:>8} {:>12} {:>12} {:>10} {:>10} {:>10}",
            "Duration", "Windows", "Optimum%", "Simple%", "Diff pp", "Win%", "p(adj)"
        );
        println!("{}", "─".repeat(78));

        for d in &self.durations {
            let c = &d.comparison;
            println!(
                "{:<10} {:>8} {:>12.2} {:>12.2} {:>+10.2} {:>10.1} {:>10}",
                format!("{}w", d.duration_weeks),
                c.paired_windows,
                c.optimum.returns.mean * 100.0,
                c.simple.returns.mean * 100.0,
                c.comparison.outperformance_pp,
                c.comparison.win_rate * 100.0,
                c.comparison
                    .adjusted_p_value
                    .map_or_else(|| "n/a".to_string(), |p| format!("{:.4}", p))
            );
        }

        let b = &self.blended;
        println!("\n📊 Blended ({} windows):", b.total_windows);
        println!(
            "   Optimum mean {:+.2}% | Simple mean {:+.2}%",
            b.optimum.mean * 100.0,
            b.simple.mean * 100.0
        );
        println!(
            "   Outperformance {:+.2}pp | Win rate {:.1}% | {:.2}x",
            b.outperformance_pp,
            b.win_rate * 100.0,
            b.times_better
        );

        if let Some(best) = self
            .durations
            .iter()
            .max_by(|a, b| {
                a.comparison
                    .comparison
                    .outperformance_pp
                    .total_cmp(&b.comparison.comparison.outperformance_pp)
            })
        {
            println!(
                "\n🏆 Largest edge: {}w ({:+.2}pp)",
                best.duration_weeks, best.comparison.comparison.outperformance_pp
            );
        }

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::runner::SimulationParams;
    use crate::backtest::synthetic::{MarketScenario, SyntheticDataGenerator};
    use crate::backtest::table::TableParams;

    fn setup() -> (BacktestRunner, WeeklyTable, PriceSeries) {
        let mut gen = SyntheticDataGenerator::new(7);
        let start = NaiveDate::from_ymd_opt(2019, 1, 7).unwrap();
        let series = PriceSeries::new(gen.generate(MarketScenario::Volatile, 1100, start)).unwrap();
        let table = WeeklyTable::build(&series, &TableParams::default()).unwrap();
        let runner = BacktestRunner::new(SimulationParams::default()).unwrap();
        (runner, table, series)
    }

    fn params(series: &PriceSeries) -> SweepParams {
        SweepParams {
            overall_start: series.first_date().unwrap(),
            overall_end: series.last_date().unwrap(),
            durations_weeks: vec![26, 52, 520],
            sampling: SamplingMode::Rolling,
            rolling_step_weeks: 4,
            correction: CorrectionMethod::Holm,
            comparison: ComparisonParams {
                n_bootstrap: 200,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_sweep_covers_fitting_durations() {
        let (runner, table, series) = setup();
        let report = run_duration_sweep(&runner, &table, &series, &params(&series)).unwrap();

        // 520 weeks does not fit in ~3 years of data
        let durations: Vec<u32> = report.durations.iter().map(|d| d.duration_weeks).collect();
        assert_eq!(durations, vec![26, 52]);
        for d in &report.durations {
            assert_eq!(d.skipped_windows, 0);
            assert_eq!(d.windows.len(), d.comparison.windows);
        }
        assert_eq!(
            report.blended.total_windows,
            report.durations.iter().map(|d| d.comparison.paired_windows).sum::<usize>()
        );
    }

    #[test]
    fn test_sweep_is_deterministic() {
        let (runner, table, series) = setup();
        let p = params(&series);
        let a = run_duration_sweep(&runner, &table, &series, &p).unwrap();
        let b = run_duration_sweep(&runner, &table, &series, &p).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_windows_in_order() {
        let (runner, table, series) = setup();
        let report = run_duration_sweep(&runner, &table, &series, &params(&series)).unwrap();
        for d in &report.durations {
            for pair in d.windows.windows(2) {
                assert!(pair[0].window.start_date < pair[1].window.start_date);
            }
        }
    }

    #[test]
    fn test_adjusted_p_not_below_raw() {
        let (runner, table, series) = setup();
        let report = run_duration_sweep(&runner, &table, &series, &params(&series)).unwrap();
        for d in &report.durations {
            let raw = d.comparison.comparison.paired_t.p_value;
            if let Some(adj) = d.comparison.comparison.adjusted_p_value {
                assert!(adj >= raw - 1e-12);
            }
        }
    }
}
