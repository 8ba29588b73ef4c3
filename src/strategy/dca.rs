use super::{Strategy, WeekContext};

/// Simple dollar cost averaging
///
/// Buys the fixed weekly budget at every priced week regardless of price.
/// Never sells and ignores the bands entirely; this is the passive baseline
/// the Optimum strategy is measured against.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleDca;

impl SimpleDca {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for SimpleDca {
    fn allocate(&self, week: &WeekContext<'_>) -> f64 {
        week.weekly_budget
    }

    fn name(&self) -> &str {
        "Simple DCA"
    }
}
