use super::rolling::{rolling_mean, rolling_volatility, rolling_vwap};
use crate::models::{Bands, WeeklyRecord};
use serde::{Deserialize, Serialize};

/// Moving average used as the band centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingAverageKind {
    Simple,
    VolumeWeighted,
}

impl Default for MovingAverageKind {
    fn default() -> Self {
        MovingAverageKind::Simple
    }
}

/// Fill rolling volatility, moving average and bands on each record
///
/// Bands are only set when both the moving average and the volatility are
/// defined for the row.
pub fn apply_bands(records: &mut [WeeklyRecord], lookback: usize, kind: MovingAverageKind) {
    let returns: Vec<Option<f64>> = records.iter().map(|r| r.weekly_return).collect();
    let closes: Vec<Option<f64>> = records.iter().map(|r| r.weekly_close).collect();

    let volatility = rolling_volatility(&returns, lookback);
    let moving_average = match kind {
        MovingAverageKind::Simple => rolling_mean(&closes, lookback),
        MovingAverageKind::VolumeWeighted => {
            let volumes: Vec<Option<f64>> = records.iter().map(|r| r.weekly_volume).collect();
            rolling_vwap(&closes, &volumes, lookback)
        }
    };

    for ((record, vol), ma) in records.iter_mut().zip(volatility).zip(moving_average) {
        record.rolling_volatility = vol;
        record.moving_average = ma;
        record.bands = match (ma, vol) {
            (Some(ma), Some(vol)) => Some(Bands::around(ma, vol)),
            _ => None,
        };
    }
}
