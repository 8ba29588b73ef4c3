// Accumulation strategies
pub mod dca;
pub mod optimum;
pub mod signals;

pub use dca::SimpleDca;
pub use optimum::OptimumDca;

use crate::models::WeeklyRecord;

/// Everything a strategy may look at when sizing one week
#[derive(Debug, Clone, Copy)]
pub struct WeekContext<'a> {
    pub record: &'a WeeklyRecord,
    /// Weekly close used for the conversion to units
    pub price: f64,
    /// First priced close in the current window
    pub entry_price: f64,
    pub weekly_budget: f64,
}

/// Base trait for all accumulation strategies
pub trait Strategy: Send + Sync {
    /// Dollar amount to trade this week; negative means sell
    fn allocate(&self, week: &WeekContext<'_>) -> f64;

    /// Get strategy name
    fn name(&self) -> &str;
}
