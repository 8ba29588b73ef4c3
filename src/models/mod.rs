use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single daily price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: f64,
    pub daily_volume: Option<f64>,
}

impl PriceObservation {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price,
            daily_volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.daily_volume = Some(volume);
        self
    }
}

/// Volatility band a weekly close falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Within,
    Lower2,
    Lower3,
    Lower4,
    Upper2,
    Upper3,
    Upper4,
}

impl Band {
    /// Sigma multiple of the shell, `None` inside the bands
    pub fn sigma(&self) -> Option<u8> {
        match self {
            Band::Within => None,
            Band::Lower2 | Band::Upper2 => Some(2),
            Band::Lower3 | Band::Upper3 => Some(3),
            Band::Lower4 | Band::Upper4 => Some(4),
        }
    }

    pub fn is_lower(&self) -> bool {
        matches!(self, Band::Lower2 | Band::Lower3 | Band::Lower4)
    }

    pub fn is_upper(&self) -> bool {
        matches!(self, Band::Upper2 | Band::Upper3 | Band::Upper4)
    }
}

impl Default for Band {
    fn default() -> Self {
        Band::Within
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Band::Within => "within",
            Band::Lower2 => "lower_2sd",
            Band::Lower3 => "lower_3sd",
            Band::Lower4 => "lower_4sd",
            Band::Upper2 => "upper_2sd",
            Band::Upper3 => "upper_3sd",
            Band::Upper4 => "upper_4sd",
        };
        write!(f, "{}", label)
    }
}

/// The six band boundaries around the moving average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub lower_4: f64,
    pub lower_3: f64,
    pub lower_2: f64,
    pub upper_2: f64,
    pub upper_3: f64,
    pub upper_4: f64,
}

impl Bands {
    /// Build `ma * (1 ± k * vol)` for k in {2, 3, 4}
    pub fn around(moving_average: f64, volatility: f64) -> Self {
        let lower = |k: f64| moving_average * (1.0 - k * volatility);
        let upper = |k: f64| moving_average * (1.0 + k * volatility);
        Self {
            lower_4: lower(4.0),
            lower_3: lower(3.0),
            lower_2: lower(2.0),
            upper_2: upper(2.0),
            upper_3: upper(3.0),
            upper_4: upper(4.0),
        }
    }

    pub fn lower(&self, sigma: u8) -> f64 {
        match sigma {
            2 => self.lower_2,
            3 => self.lower_3,
            _ => self.lower_4,
        }
    }

    pub fn upper(&self, sigma: u8) -> f64 {
        match sigma {
            2 => self.upper_2,
            3 => self.upper_3,
            _ => self.upper_4,
        }
    }
}

/// One row of the weekly table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecord {
    pub anchor_date: NaiveDate,
    pub weekly_close: Option<f64>,
    pub weekly_volume: Option<f64>,
    pub weekly_return: Option<f64>,
    pub rolling_volatility: Option<f64>,
    pub moving_average: Option<f64>,
    pub bands: Option<Bands>,
    pub band: Band,
    pub investment_multiple: f64,
    pub buy_sell_multiplier: Option<i8>,
}

impl WeeklyRecord {
    /// A record with only the anchor and close filled in; the indicator and
    /// signal stages fill the rest
    pub fn new(anchor_date: NaiveDate, weekly_close: Option<f64>) -> Self {
        Self {
            anchor_date,
            weekly_close,
            weekly_volume: None,
            weekly_return: None,
            rolling_volatility: None,
            moving_average: None,
            bands: None,
            band: Band::Within,
            investment_multiple: 1.0,
            buy_sell_multiplier: None,
        }
    }
}

/// A (start, end) evaluation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_weeks: u32,
}

impl Window {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, duration_weeks: u32) -> Self {
        Self {
            start_date,
            end_date,
            duration_weeks,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn years(&self) -> f64 {
        self.duration_weeks as f64 * 7.0 / 365.25
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} ({}w)",
            self.start_date, self.end_date, self.duration_weeks
        )
    }
}

/// One simulated week in a strategy's transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub price: f64,
    pub band: Band,
    /// Dollars requested by the strategy before clamping
    pub requested_amount: f64,
    /// Dollars actually exchanged (negative for sells)
    pub amount: f64,
    pub units: f64,
    pub cumulative_units: f64,
    pub cumulative_units_bought: f64,
    pub cumulative_units_sold: f64,
    pub net_invested: f64,
    pub average_cost: Option<f64>,
    /// P/L of the current price against the average cost
    pub rolling_pnl: Option<f64>,
    pub capital_balance: f64,
}

/// Final state of one strategy over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub strategy: String,
    pub total_units: f64,
    pub net_invested: f64,
    pub final_price: f64,
    pub final_value: f64,
    pub profit: f64,
    /// Undefined when nothing was net invested
    pub profit_pct: Option<f64>,
    pub period_weeks: usize,
    pub average_cost: Option<f64>,
    pub capital_balance: f64,
}

impl StrategyOutcome {
    /// Profit as a fraction, for the statistics layer
    pub fn return_fraction(&self) -> Option<f64> {
        self.profit_pct.map(|pct| pct / 100.0)
    }
}
