// Weekly indicators
// Aggregation, rolling volatility / moving averages, bands and global scalars

pub mod bands;
pub mod rolling;
pub mod sensitivity;
pub mod weekly;

pub use bands::{apply_bands, MovingAverageKind};
pub use rolling::{lookback_range, rolling_mean, rolling_volatility, rolling_vwap, sample_std};
pub use sensitivity::{compute_sensitivity, GlobalStats};
pub use weekly::{aggregate_weekly, next_weekday_on_or_after, AggregationParams};
