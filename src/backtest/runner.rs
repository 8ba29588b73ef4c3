use super::metrics::RunMetrics;
use super::table::WeeklyTable;
use crate::data::PriceSeries;
use crate::models::{Band, StrategyOutcome, Transaction, Window};
use crate::strategy::{OptimumDca, SimpleDca, Strategy, WeekContext};
use crate::{DcaError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Holdings below this are treated as a broken invariant rather than rounding
const UNITS_TOLERANCE: f64 = 1e-10;

/// Cash and sell policy for a simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub weekly_budget: f64,
    /// Let the capital balance go negative instead of capping buys
    pub unlimited_capital: bool,
    /// Execute negative amounts as sells; otherwise they become zero
    pub allow_negative_investment: bool,
    pub entry_drift_adjustment: bool,
    /// Terminal valuation price; defaults to the last price on or before the end date
    pub final_price: Option<f64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            weekly_budget: 250.0,
            unlimited_capital: true,
            allow_negative_investment: true,
            entry_drift_adjustment: false,
            final_price: None,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<()> {
        if !self.weekly_budget.is_finite() || self.weekly_budget < 0.0 {
            return Err(DcaError::Configuration(format!(
                "weekly_budget must be >= 0, got {}",
                self.weekly_budget
            )));
        }
        if let Some(price) = self.final_price {
            if !price.is_finite() || price <= 0.0 {
                return Err(DcaError::Configuration(format!(
                    "final_price must be positive, got {}",
                    price
                )));
            }
        }
        Ok(())
    }
}

/// Running accumulator for one strategy over one window
///
/// Created at window start, ticked once per priced week in date order and
/// consumed by [`StrategyState::finalize`].
#[derive(Debug, Clone)]
pub struct StrategyState {
    units: f64,
    units_bought: f64,
    units_sold: f64,
    net_invested: f64,
    capital_balance: f64,
    unlimited_capital: bool,
    allow_sells: bool,
    transactions: Vec<Transaction>,
}

impl StrategyState {
    pub fn new(starting_capital: f64, unlimited_capital: bool, allow_sells: bool) -> Self {
        Self {
            units: 0.0,
            units_bought: 0.0,
            units_sold: 0.0,
            net_invested: 0.0,
            capital_balance: starting_capital,
            unlimited_capital,
            allow_sells,
            transactions: Vec::new(),
        }
    }

    pub fn units(&self) -> f64 {
        self.units
    }

    pub fn net_invested(&self) -> f64 {
        self.net_invested
    }

    pub fn capital_balance(&self) -> f64 {
        self.capital_balance
    }

    /// Apply one week's requested dollar amount at `price`
    ///
    /// Sells are clamped to the units held; buys are clamped to the remaining
    /// balance unless capital is unlimited.
    pub fn tick(
        &mut self,
        date: NaiveDate,
        price: f64,
        band: Band,
        requested_amount: f64,
    ) -> Result<&Transaction> {
        let mut amount = requested_amount;
        if amount < 0.0 && !self.allow_sells {
            amount = 0.0;
        }
        if amount > 0.0 && !self.unlimited_capital {
            amount = amount.min(self.capital_balance.max(0.0));
        }

        let units = if amount >= 0.0 {
            let bought = amount / price;
            self.units_bought += bought;
            bought
        } else {
            let sold = (-amount / price).min(self.units.max(0.0));
            amount = -sold * price;
            self.units_sold += sold;
            -sold
        };

        self.units += units;
        if self.units < -UNITS_TOLERANCE {
            return Err(DcaError::InvariantViolation(format!(
                "negative holdings {} on {}",
                self.units, date
            )));
        }
        self.units = self.units.max(0.0);
        self.net_invested += amount;
        self.capital_balance -= amount;

        let average_cost = self.average_cost();
        let rolling_pnl = average_cost
            .filter(|cost| *cost > 0.0)
            .map(|cost| (price - cost) / cost);

        tracing::debug!(
            "{} {} @ {:.2}: {:+.2} → {:.8} units",
            date,
            band,
            price,
            amount,
            self.units
        );

        self.transactions.push(Transaction {
            date,
            price,
            band,
            requested_amount,
            amount,
            units,
            cumulative_units: self.units,
            cumulative_units_bought: self.units_bought,
            cumulative_units_sold: self.units_sold,
            net_invested: self.net_invested,
            average_cost,
            rolling_pnl,
            capital_balance: self.capital_balance,
        });

        self.transactions
            .last()
            .ok_or_else(|| DcaError::InvariantViolation("transaction log empty".to_string()))
    }

    fn average_cost(&self) -> Option<f64> {
        if self.units > 0.0 {
            Some(self.net_invested / self.units)
        } else {
            None
        }
    }

    /// Value the position at `terminal_price` and close the window
    pub fn finalize(self, strategy: &str, terminal_price: f64, period_weeks: usize) -> StrategyRun {
        let final_value = self.units * terminal_price;
        let profit = final_value - self.net_invested;
        let profit_pct = if self.net_invested > 0.0 {
            Some(profit / self.net_invested * 100.0)
        } else {
            None
        };
        let average_cost = self.average_cost();

        StrategyRun {
            outcome: StrategyOutcome {
                strategy: strategy.to_string(),
                total_units: self.units,
                net_invested: self.net_invested,
                final_price: terminal_price,
                final_value,
                profit,
                profit_pct,
                period_weeks,
                average_cost,
                capital_balance: self.capital_balance,
            },
            transactions: self.transactions,
        }
    }
}

/// A finalized strategy with its full weekly log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRun {
    pub outcome: StrategyOutcome,
    pub transactions: Vec<Transaction>,
}

/// Both strategies simulated over the same window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairedRun {
    pub window: Window,
    pub optimum: StrategyRun,
    pub simple: StrategyRun,
}

/// Simulates strategies over the weekly table
pub struct BacktestRunner {
    params: SimulationParams,
}

impl BacktestRunner {
    pub fn new(params: SimulationParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Run one strategy over `[start, end]`
    ///
    /// # Arguments
    /// * `strategy` - Allocation rule to simulate
    /// * `table` - Annotated weekly history
    /// * `series` - Daily prices, used for the terminal valuation
    /// * `start`, `end` - Inclusive window; `end < start` yields a zero-week run
    ///
    /// # Returns
    /// The finalized outcome and the transaction log
    pub fn run<S: Strategy>(
        &self,
        strategy: &S,
        table: &WeeklyTable,
        series: &PriceSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<StrategyRun> {
        let priced: Vec<_> = table
            .between(start, end)
            .iter()
            .filter_map(|rec| rec.weekly_close.map(|price| (rec, price)))
            .collect();

        let period_weeks = priced.len();
        let starting_capital = period_weeks as f64 * self.params.weekly_budget;
        let entry_price = priced.first().map(|(_, price)| *price).unwrap_or(0.0);

        let mut state = StrategyState::new(
            starting_capital,
            self.params.unlimited_capital,
            self.params.allow_negative_investment,
        );

        for (record, price) in priced {
            let week = WeekContext {
                record,
                price,
                entry_price,
                weekly_budget: self.params.weekly_budget,
            };
            let requested = strategy.allocate(&week);
            state.tick(record.anchor_date, price, record.band, requested)?;
        }

        let terminal_price = self
            .params
            .final_price
            .or_else(|| series.price_on_or_before(end))
            .unwrap_or(0.0);

        let run = state.finalize(strategy.name(), terminal_price, period_weeks);
        tracing::debug!(
            "{} {} → {}: {} weeks, {:.8} units, invested ${:.2}",
            strategy.name(),
            start,
            end,
            period_weeks,
            run.outcome.total_units,
            run.outcome.net_invested
        );
        Ok(run)
    }

    /// Run Optimum and Simple DCA over the same window
    pub fn run_pair(
        &self,
        table: &WeeklyTable,
        series: &PriceSeries,
        window: &Window,
    ) -> Result<PairedRun> {
        let optimum_strategy =
            OptimumDca::new().with_entry_drift_adjustment(self.params.entry_drift_adjustment);
        let optimum = self.run(
            &optimum_strategy,
            table,
            series,
            window.start_date,
            window.end_date,
        )?;
        let simple = self.run(&SimpleDca::new(), table, series, window.start_date, window.end_date)?;
        Ok(PairedRun {
            window: *window,
            optimum,
            simple,
        })
    }

    /// Run both strategies and print their reports
    pub fn run_and_report(
        &self,
        table: &WeeklyTable,
        series: &PriceSeries,
        window: &Window,
        label: &str,
    ) -> Result<PairedRun> {
        println!("\n{}", "=".repeat(60));
        println!("{}", label);
        println!("{}", "=".repeat(60));

        let pair = self.run_pair(table, series, window)?;
        let optimum = RunMetrics::from_run(&pair.optimum);
        let simple = RunMetrics::from_run(&pair.simple);
        optimum.print_report();
        simple.print_report();
        RunMetrics::print_side_by_side(&optimum, &simple);

        Ok(pair)
    }
}
