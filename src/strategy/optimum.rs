use super::{Strategy, WeekContext};

/// Below this drawdown from the window's first price the drift adjustment doubles
const DEEP_DRIFT_THRESHOLD: f64 = -0.4;

/// Volatility-band driven accumulation
///
/// Weekly amount = `(investment_multiple + (buy_sell_multiplier or 1)) × budget`.
/// In an upper shell both terms are negative and the week becomes a sell.
///
/// With `entry_drift_adjustment` the multiple is first reduced by the price
/// change since the window's first week (twice that change once the price
/// sits more than 40% below entry).
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimumDca {
    entry_drift_adjustment: bool,
}

impl OptimumDca {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry_drift_adjustment(mut self, enabled: bool) -> Self {
        self.entry_drift_adjustment = enabled;
        self
    }

    fn adjusted_multiple(&self, week: &WeekContext<'_>) -> f64 {
        let multiple = week.record.investment_multiple;
        if !self.entry_drift_adjustment || week.entry_price <= 0.0 {
            return multiple;
        }
        let drift = week.price / week.entry_price - 1.0;
        if drift < DEEP_DRIFT_THRESHOLD {
            multiple - 2.0 * drift
        } else {
            multiple - drift
        }
    }
}

impl Strategy for OptimumDca {
    fn allocate(&self, week: &WeekContext<'_>) -> f64 {
        let multiple = self.adjusted_multiple(week);
        let tier = week.record.buy_sell_multiplier.map_or(1.0, f64::from);
        (multiple + tier) * week.weekly_budget
    }

    fn name(&self) -> &str {
        "Optimum DCA"
    }
}
