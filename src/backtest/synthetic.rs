use crate::models::PriceObservation;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+0.3% daily drift)
    Uptrend,
    /// Steady downtrend with noise (-0.2% daily drift)
    Downtrend,
    /// Mean-reverting chop around the starting price
    Sideways,
    /// Large random swings (±5% daily)
    Volatile,
    /// Random walk with every ninth day missing
    WithGaps,
    /// Rally, 60% crash, then a slow recovery
    CrashAndRecovery,
    /// Strictly increasing prices, no noise
    Monotonic,
}

impl MarketScenario {
    pub fn all() -> [MarketScenario; 7] {
        [
            MarketScenario::Uptrend,
            MarketScenario::Downtrend,
            MarketScenario::Sideways,
            MarketScenario::Volatile,
            MarketScenario::WithGaps,
            MarketScenario::CrashAndRecovery,
            MarketScenario::Monotonic,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketScenario::Uptrend => "📈 Uptrend",
            MarketScenario::Downtrend => "📉 Downtrend",
            MarketScenario::Sideways => "↔️  Sideways",
            MarketScenario::Volatile => "⚡ Volatile",
            MarketScenario::WithGaps => "🕳️  With Gaps",
            MarketScenario::CrashAndRecovery => "💥 Crash & Recovery",
            MarketScenario::Monotonic => "🚀 Monotonic",
        }
    }
}

/// Generates synthetic daily prices for backtesting
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 20_000.0,
            base_volume: 1_000_000.0,
        }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Generate daily observations for a market scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_days` - Number of calendar days to cover (gaps produce fewer rows)
    /// * `start` - Date of the first observation
    ///
    /// # Returns
    /// Date-sorted observations with prices and daily volume
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_days: usize,
        start: NaiveDate,
    ) -> Vec<PriceObservation> {
        let mut observations = Vec::with_capacity(num_days);
        let mut price = self.base_price;
        let crash_start = num_days / 3;
        let crash_len = (num_days / 10).max(1);

        for day in 0..num_days {
            price = match scenario {
                MarketScenario::Uptrend => price * (1.003 + self.rng.gen_range(-0.02..0.02)),
                MarketScenario::Downtrend => price * (0.998 + self.rng.gen_range(-0.02..0.02)),
                MarketScenario::Sideways => {
                    let reversion = (self.base_price - price) * 0.05;
                    price + reversion + price * self.rng.gen_range(-0.015..0.015)
                }
                MarketScenario::Volatile => {
                    let next = price * (1.0 + self.rng.gen_range(-0.05..0.05));
                    next.max(self.base_price * 0.5)
                }
                MarketScenario::WithGaps => price * (1.0 + self.rng.gen_range(-0.02..0.021)),
                MarketScenario::CrashAndRecovery => {
                    let drift = if day < crash_start {
                        0.004
                    } else if day < crash_start + crash_len {
                        // compounds to roughly -60% over the crash
                        (0.4f64).ln() / crash_len as f64
                    } else {
                        0.002
                    };
                    price * (drift.exp() + self.rng.gen_range(-0.01..0.01))
                }
                MarketScenario::Monotonic => price * 1.002,
            };

            if scenario == MarketScenario::WithGaps && day % 9 == 8 {
                continue;
            }

            let volume = self.base_volume * self.rng.gen_range(0.7..1.3);
            observations.push(
                PriceObservation::new(start + Duration::days(day as i64), price).with_volume(volume),
            );
        }

        observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let prices = gen.generate(MarketScenario::Uptrend, 500, start());

        assert_eq!(prices.len(), 500);
        let first = prices.first().unwrap().price;
        let last = prices.last().unwrap().price;
        assert!(last > first, "Uptrend should end higher: {} -> {}", first, last);
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let prices = gen.generate(MarketScenario::Downtrend, 500, start());

        let first = prices.first().unwrap().price;
        let last = prices.last().unwrap().price;
        assert!(last < first, "Downtrend should end lower: {} -> {}", first, last);
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let prices = gen.generate(MarketScenario::Sideways, 500, start());
        let base = gen.base_price();
        for obs in &prices {
            assert!(
                obs.price > base * 0.8 && obs.price < base * 1.2,
                "Sideways should stay near base: {} vs {}",
                obs.price,
                base
            );
        }
    }

    #[test]
    fn test_generate_with_gaps() {
        let mut gen = SyntheticDataGenerator::new(42);
        let prices = gen.generate(MarketScenario::WithGaps, 90, start());
        assert_eq!(prices.len(), 80);
        let has_gap = prices
            .windows(2)
            .any(|w| (w[1].date - w[0].date).num_days() > 1);
        assert!(has_gap, "Should contain date gaps");
    }

    #[test]
    fn test_crash_scenario_draws_down() {
        let mut gen = SyntheticDataGenerator::new(42);
        let prices = gen.generate(MarketScenario::CrashAndRecovery, 600, start());
        let peak = prices[..200].iter().map(|p| p.price).fold(0.0, f64::max);
        let trough = prices[200..260].iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
        assert!(trough < peak * 0.6);
    }

    #[test]
    fn test_monotonic_is_strictly_increasing() {
        let mut gen = SyntheticDataGenerator::new(1);
        let prices = gen.generate(MarketScenario::Monotonic, 100, start());
        assert!(prices.windows(2).all(|w| w[1].price > w[0].price));
    }

    #[test]
    fn test_prices_positive_and_dates_sequential() {
        for scenario in MarketScenario::all() {
            let mut gen = SyntheticDataGenerator::new(3);
            let prices = gen.generate(scenario, 365, start());
            assert!(prices.iter().all(|p| p.price > 0.0));
            assert!(prices.windows(2).all(|w| w[1].date > w[0].date));
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = SyntheticDataGenerator::new(9).generate(MarketScenario::Volatile, 50, start());
        let b = SyntheticDataGenerator::new(9).generate(MarketScenario::Volatile, 50, start());
        assert_eq!(a, b);
    }
}
