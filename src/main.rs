use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use optimum_dca::backtest::export::{
    write_csv_file, write_json, write_transactions_csv, write_weekly_csv,
    write_window_outcomes_csv,
};
use optimum_dca::backtest::{run_duration_sweep, BacktestRunner, SamplingMode, WeeklyTable};
use optimum_dca::data::{load_prices_csv, PriceSeries};
use optimum_dca::Settings;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "optimum-dca",
    about = "Backtest volatility-band Optimum DCA against fixed-amount DCA"
)]
struct Cli {
    /// Settings file (TOML); defaults to ./optimum-dca.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference date; the anchor week after it takes the latest known price
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the weekly table and write it as CSV
    Weekly {
        /// Daily price CSV (date, price[, daily_volume])
        #[arg(long)]
        prices: PathBuf,

        /// Output CSV path
        #[arg(long, default_value = "weekly_table.csv")]
        out: PathBuf,
    },

    /// Run both strategies over one window
    Run {
        #[arg(long)]
        prices: PathBuf,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        budget: Option<f64>,

        /// Terminal valuation price
        #[arg(long)]
        final_price: Option<f64>,

        /// Directory for the two transaction-log CSVs
        #[arg(long)]
        transactions_dir: Option<PathBuf>,

        /// Write both runs as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Sweep window durations and compare the strategies statistically
    Sweep {
        #[arg(long)]
        prices: PathBuf,

        /// Comma-separated window durations in weeks
        #[arg(long, value_delimiter = ',')]
        durations: Option<Vec<u32>>,

        #[arg(long, value_enum)]
        sampling: Option<Sampling>,

        /// Rolling step in weeks
        #[arg(long)]
        step: Option<u32>,

        #[arg(long)]
        json: Option<PathBuf>,

        /// One row per simulated window
        #[arg(long)]
        windows_csv: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Sampling {
    NonOverlapping,
    Rolling,
}

impl From<Sampling> for SamplingMode {
    fn from(value: Sampling) -> Self {
        match value {
            Sampling::NonOverlapping => SamplingMode::NonOverlapping,
            Sampling::Rolling => SamplingMode::Rolling,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let mut settings =
        Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if cli.today.is_some() {
        settings.backtest.today = cli.today;
    }

    match cli.command {
        Command::Weekly { prices, out } => {
            let (series, table) = load_table(&prices, &settings)?;
            tracing::info!(
                "📅 {} daily prices → {} weekly records",
                series.len(),
                table.len()
            );
            write_csv_file(&out, |file| write_weekly_csv(file, table.records()))
                .with_context(|| format!("failed to write {}", out.display()))?;
        }

        Command::Run {
            prices,
            start,
            end,
            budget,
            final_price,
            transactions_dir,
            json,
        } => {
            if let Some(budget) = budget {
                settings.backtest.weekly_budget = budget;
            }
            if final_price.is_some() {
                settings.backtest.final_price = final_price;
            }
            settings.validate()?;

            if start.is_some() {
                settings.backtest.start_date = start;
            }
            if end.is_some() {
                settings.backtest.end_date = end;
            }

            let (series, table) = load_table(&prices, &settings)?;
            let (first, last) = match (series.first_date(), series.last_date()) {
                (Some(first), Some(last)) => (first, last),
                _ => bail!("price series is empty"),
            };
            // an end before the start simulates zero weeks
            let window = settings.backtest_window(first, last);
            let runner = BacktestRunner::new(settings.simulation_params())?;
            let pair = runner.run_and_report(
                &table,
                &series,
                &window,
                &format!("🔬 OPTIMUM vs SIMPLE DCA  {}", window),
            )?;

            if let Some(dir) = transactions_dir {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                write_csv_file(&dir.join("optimum_transactions.csv"), |file| {
                    write_transactions_csv(file, &pair.optimum.transactions)
                })?;
                write_csv_file(&dir.join("simple_transactions.csv"), |file| {
                    write_transactions_csv(file, &pair.simple.transactions)
                })?;
            }
            if let Some(path) = json {
                write_json(&path, &pair)?;
            }
        }

        Command::Sweep {
            prices,
            durations,
            sampling,
            step,
            json,
            windows_csv,
        } => {
            if let Some(durations) = durations {
                settings.analysis.durations_weeks = durations;
            }
            if let Some(sampling) = sampling {
                settings.analysis.sampling = sampling.into();
            }
            if let Some(step) = step {
                settings.analysis.rolling_step_weeks = step;
            }
            settings.validate()?;

            let (series, table) = load_table(&prices, &settings)?;
            let (first, last) = match (series.first_date(), series.last_date()) {
                (Some(first), Some(last)) => (first, last),
                _ => bail!("price series is empty"),
            };

            let runner = BacktestRunner::new(settings.simulation_params())?;
            let params = settings.sweep_params(first, last);
            let report = run_duration_sweep(&runner, &table, &series, &params)?;

            for duration in &report.durations {
                duration.comparison.print_report();
            }
            report.print_summary();

            if let Some(path) = windows_csv {
                write_csv_file(&path, |file| write_window_outcomes_csv(file, &report))?;
            }
            if let Some(path) = json {
                write_json(&path, &report)?;
            }
        }
    }

    Ok(())
}

fn load_table(path: &Path, settings: &Settings) -> Result<(PriceSeries, WeeklyTable)> {
    let series = load_prices_csv(path)
        .with_context(|| format!("failed to load prices from {}", path.display()))?;
    let table = WeeklyTable::build(&series, &settings.table_params())?;
    Ok((series, table))
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("optimum_dca=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
