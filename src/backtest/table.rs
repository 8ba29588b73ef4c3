use crate::data::PriceSeries;
use crate::indicators::{
    aggregate_weekly, apply_bands, compute_sensitivity, AggregationParams, GlobalStats,
    MovingAverageKind,
};
use crate::models::WeeklyRecord;
use crate::strategy::signals::annotate_signals;
use crate::{DcaError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parameters for building the weekly table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableParams {
    pub aggregation: AggregationParams,
    pub band_lookback_weeks: usize,
    pub moving_average: MovingAverageKind,
}

impl Default for TableParams {
    fn default() -> Self {
        Self {
            aggregation: AggregationParams::default(),
            band_lookback_weeks: 14, // ~one quarter of weekly returns
            moving_average: MovingAverageKind::Simple,
        }
    }
}

/// Fully annotated weekly history plus its global scalars
///
/// Built once per run and read-only afterwards; every window simulation
/// borrows the same table.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyTable {
    records: Vec<WeeklyRecord>,
    stats: GlobalStats,
    params: TableParams,
}

impl WeeklyTable {
    /// Aggregate, compute bands, derive global scalars, then classify signals
    pub fn build(series: &PriceSeries, params: &TableParams) -> Result<Self> {
        if params.band_lookback_weeks == 0 {
            return Err(DcaError::Configuration(
                "band_lookback_weeks must be at least 1".to_string(),
            ));
        }

        let mut records = aggregate_weekly(series, &params.aggregation)?;
        apply_bands(&mut records, params.band_lookback_weeks, params.moving_average);
        let stats = compute_sensitivity(&records);
        annotate_signals(&mut records, &stats);

        tracing::info!(
            "📊 Weekly table: {} weeks, sensitivity {:.4}, mean return {:.4}",
            records.len(),
            stats.sensitivity,
            stats.mean_return
        );

        Ok(Self {
            records,
            stats,
            params: *params,
        })
    }

    pub fn records(&self) -> &[WeeklyRecord] {
        &self.records
    }

    pub fn stats(&self) -> &GlobalStats {
        &self.stats
    }

    pub fn params(&self) -> &TableParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records anchored inside `[start, end]`; empty when `end < start`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[WeeklyRecord] {
        let lo = self.records.partition_point(|r| r.anchor_date < start);
        let hi = self.records.partition_point(|r| r.anchor_date <= end);
        if lo >= hi {
            &[]
        } else {
            &self.records[lo..hi]
        }
    }
}
