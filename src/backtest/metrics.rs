use super::runner::StrategyRun;
use crate::models::{Band, StrategyOutcome};
use crate::stats::max_drawdown_of_values;
use serde::{Deserialize, Serialize};

/// Path metrics for one strategy run, derived from its transaction log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub outcome: StrategyOutcome,

    // Activity
    pub weeks_bought: usize,
    pub weeks_sold: usize,
    pub weeks_idle: usize,
    pub dollars_bought: f64,
    pub dollars_sold: f64,
    pub units_bought: f64,
    pub units_sold: f64,

    // Band exposure
    pub weeks_in_lower_bands: usize,
    pub weeks_in_upper_bands: usize,

    // Path risk
    pub peak_position_value: f64,
    /// Deepest decline of the marked-to-market position value
    pub max_drawdown_pct: f64,
    pub min_capital_balance: f64,
}

impl RunMetrics {
    pub fn from_run(run: &StrategyRun) -> Self {
        let txs = &run.transactions;

        let weeks_bought = txs.iter().filter(|t| t.amount > 0.0).count();
        let weeks_sold = txs.iter().filter(|t| t.amount < 0.0).count();
        let dollars_bought: f64 = txs.iter().filter(|t| t.amount > 0.0).map(|t| t.amount).sum();
        let dollars_sold: f64 = txs.iter().filter(|t| t.amount < 0.0).map(|t| -t.amount).sum();

        let values: Vec<f64> = txs.iter().map(|t| t.cumulative_units * t.price).collect();
        let peak_position_value = values.iter().copied().fold(0.0, f64::max);

        let last = txs.last();
        Self {
            outcome: run.outcome.clone(),
            weeks_bought,
            weeks_sold,
            weeks_idle: txs.len() - weeks_bought - weeks_sold,
            dollars_bought,
            dollars_sold,
            units_bought: last.map_or(0.0, |t| t.cumulative_units_bought),
            units_sold: last.map_or(0.0, |t| t.cumulative_units_sold),
            weeks_in_lower_bands: txs.iter().filter(|t| t.band.is_lower()).count(),
            weeks_in_upper_bands: txs.iter().filter(|t| t.band.is_upper()).count(),
            peak_position_value,
            max_drawdown_pct: max_drawdown_of_values(&values) * 100.0,
            min_capital_balance: txs
                .iter()
                .map(|t| t.capital_balance)
                .fold(f64::INFINITY, f64::min)
                .min(run.outcome.capital_balance),
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        let o = &self.outcome;
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║  {:<53}║", format!("{} REPORT", o.strategy.to_uppercase()));
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 POSITION");
        println!("  Weeks Simulated:       {}", o.period_weeks);
        println!("  Units Held:            {:.8}", o.total_units);
        println!("  Net Invested:          ${:.2}", o.net_invested);
        println!("  Final Price:           ${:.2}", o.final_price);
        println!("  Final Value:           ${:.2}", o.final_value);
        match o.profit_pct {
            Some(pct) => println!("  Profit:                ${:.2} ({:+.2}%)", o.profit, pct),
            None => println!("  Profit:                ${:.2} (n/a)", o.profit),
        }
        if let Some(cost) = o.average_cost {
            println!("  Average Cost:          ${:.2}", cost);
        }

        println!("\n📈 ACTIVITY");
        println!(
            "  Buy Weeks:             {} (${:.2})",
            self.weeks_bought, self.dollars_bought
        );
        println!(
            "  Sell Weeks:            {} (${:.2})",
            self.weeks_sold, self.dollars_sold
        );
        println!("  Idle Weeks:            {}", self.weeks_idle);
        println!(
            "  Lower / Upper Bands:   {} / {}",
            self.weeks_in_lower_bands, self.weeks_in_upper_bands
        );

        println!("\n⚠️  RISK");
        println!("  Peak Position Value:   ${:.2}", self.peak_position_value);
        println!("  Max Drawdown:          {:.2}%", self.max_drawdown_pct);
        println!("  Min Capital Balance:   ${:.2}", self.min_capital_balance);

        println!("\n═══════════════════════════════════════════════════════\n");
    }

    /// Two runs over the same window in one table
    pub fn print_side_by_side(optimum: &RunMetrics, simple: &RunMetrics) {
        let pct = |o: &StrategyOutcome| {
            o.profit_pct
                .map_or_else(|| "n/a".to_string(), |p| format!("{:+.2}%", p))
        };
        println!(
            "{:<22} {:>18} {:>18}",
            "", optimum.outcome.strategy, simple.outcome.strategy
        );
        println!("{}", "─".repeat(60));
        println!(
            "{:<22} {:>18.8} {:>18.8}",
            "Units", optimum.outcome.total_units, simple.outcome.total_units
        );
        println!(
            "{:<22} {:>18.2} {:>18.2}",
            "Net invested ($)", optimum.outcome.net_invested, simple.outcome.net_invested
        );
        println!(
            "{:<22} {:>18.2} {:>18.2}",
            "Final value ($)", optimum.outcome.final_value, simple.outcome.final_value
        );
        println!(
            "{:<22} {:>18} {:>18}",
            "Profit",
            pct(&optimum.outcome),
            pct(&simple.outcome)
        );
        println!(
            "{:<22} {:>17.2}% {:>17.2}%",
            "Max drawdown", optimum.max_drawdown_pct, simple.max_drawdown_pct
        );

        if simple.outcome.total_units > 0.0 {
            let ratio = optimum.outcome.total_units / simple.outcome.total_units;
            let marker = if ratio > 1.0 { "🏆" } else { "⚠️ " };
            println!("\n{} Optimum holds {:.2}x the units of Simple DCA", marker, ratio);
        }
    }
}

/// Count of weeks per band across a log, in band order
pub fn band_histogram(run: &StrategyRun) -> Vec<(Band, usize)> {
    [
        Band::Lower4,
        Band::Lower3,
        Band::Lower2,
        Band::Within,
        Band::Upper2,
        Band::Upper3,
        Band::Upper4,
    ]
    .into_iter()
    .map(|band| {
        let count = run.transactions.iter().filter(|t| t.band == band).count();
        (band, count)
    })
    .collect()
}
