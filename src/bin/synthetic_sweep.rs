use anyhow::{Context, Result};
use chrono::NaiveDate;
use optimum_dca::backtest::{
    run_duration_sweep, BacktestRunner, ComparisonParams, MarketScenario, SamplingMode,
    SimulationParams, SweepParams, SweepReport, SyntheticDataGenerator, TableParams, WeeklyTable,
};
use optimum_dca::data::PriceSeries;
use optimum_dca::stats::CorrectionMethod;

const SEED: u64 = 42;
const NUM_DAYS: usize = 1500;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("optimum_dca=info")
        .init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║        OPTIMUM DCA SYNTHETIC SCENARIO SWEEP           ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let start = NaiveDate::from_ymd_opt(2020, 1, 6).context("invalid start date")?;
    let runner = BacktestRunner::new(SimulationParams::default())?;

    let mut all_reports = Vec::new();

    for scenario in MarketScenario::all() {
        let mut generator = SyntheticDataGenerator::new(SEED);
        let series = PriceSeries::new(generator.generate(scenario, NUM_DAYS, start))?;
        let table = WeeklyTable::build(&series, &TableParams::default())?;

        let (first, last) = match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => continue,
        };
        let params = SweepParams {
            overall_start: first,
            overall_end: last,
            durations_weeks: vec![26, 52, 104],
            sampling: SamplingMode::Rolling,
            rolling_step_weeks: 4,
            correction: CorrectionMethod::Holm,
            comparison: ComparisonParams {
                n_bootstrap: 500,
                ..Default::default()
            },
        };

        println!("\n{}", "=".repeat(60));
        println!("{}", scenario.label());
        println!("{}", "=".repeat(60));

        match run_duration_sweep(&runner, &table, &series, &params) {
            Ok(report) => {
                report.print_summary();
                all_reports.push((scenario.label().to_string(), report));
            }
            Err(e) => {
                eprintln!("❌ Sweep failed for {}: {}", scenario.label(), e);
            }
        }
    }

    print_summary_comparison(&all_reports);

    Ok(())
}

fn print_summary_comparison(results: &[(String, SweepReport)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<24} {:>8} {:>12} {:>12} {:>10} {:>8}",
        "Scenario", "Windows", "Optimum%", "Simple%", "Diff pp", "Win%"
    );
    println!("{}", "─".repeat(78));

    for (name, report) in results {
        let b = &report.blended;
        println!(
            "{:<24} {:>8} {:>12.2} {:>12.2} {:>+10.2} {:>8.1}",
            name,
            b.total_windows,
            b.optimum.mean * 100.0,
            b.simple.mean * 100.0,
            b.outperformance_pp,
            b.win_rate * 100.0
        );
    }

    println!("\n");

    let edge = |r: &SweepReport| r.blended.outperformance_pp;

    if let Some((best_name, best)) = results
        .iter()
        .filter(|(_, r)| !edge(r).is_nan())
        .max_by(|a, b| edge(&a.1).total_cmp(&edge(&b.1)))
    {
        println!(
            "🏆 Best Scenario for Optimum: {} ({:+.2}pp)",
            best_name,
            edge(best)
        );
    }

    if let Some((worst_name, worst)) = results
        .iter()
        .filter(|(_, r)| !edge(r).is_nan())
        .min_by(|a, b| edge(&a.1).total_cmp(&edge(&b.1)))
    {
        println!(
            "⚠️  Worst Scenario for Optimum: {} ({:+.2}pp)",
            worst_name,
            edge(worst)
        );
    }

    let total_windows: usize = results.iter().map(|(_, r)| r.blended.total_windows).sum();
    let avg_win_rate = if !results.is_empty() {
        results.iter().map(|(_, r)| r.blended.win_rate).sum::<f64>() / results.len() as f64
    } else {
        0.0
    };

    println!("\n📊 Overall Statistics:");
    println!("   Windows Across All Scenarios: {}", total_windows);
    println!("   Average Win Rate: {:.1}%", avg_win_rate * 100.0);

    println!("\n═══════════════════════════════════════════════════════\n");
}
