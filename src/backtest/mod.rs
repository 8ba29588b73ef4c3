pub mod comparison;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod synthetic;
pub mod table;
pub mod windows;

pub use comparison::{ComparisonParams, ComparisonResult, PairedComparison, StrategySummary};
pub use metrics::{band_histogram, RunMetrics};
pub use runner::{BacktestRunner, PairedRun, SimulationParams, StrategyRun, StrategyState};
pub use sweep::{
    run_duration_sweep, BlendedSummary, DurationReport, SweepParams, SweepReport, WindowOutcome,
};
pub use synthetic::{MarketScenario, SyntheticDataGenerator};
pub use table::{TableParams, WeeklyTable};
pub use windows::{
    effective_window_count, nominal_overlap, non_overlapping_windows, overlap_fraction,
    rolling_windows, sample_windows, SamplingMode,
};
