use super::validator::PriceValidator;
use crate::models::PriceObservation;
use crate::Result;
use chrono::NaiveDate;
use std::ops::RangeInclusive;

/// A sorted, de-duplicated daily price series
///
/// Construction sorts by date, keeps the last row seen for a repeated date,
/// and validates every row. After that the series is read-only.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    pub fn new(mut observations: Vec<PriceObservation>) -> Result<Self> {
        observations.sort_by_key(|obs| obs.date);

        let before = observations.len();
        let mut deduped: Vec<PriceObservation> = Vec::with_capacity(before);
        for obs in observations {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }
        if deduped.len() < before {
            tracing::warn!(
                "Dropped {} duplicate price rows",
                before - deduped.len()
            );
        }

        PriceValidator::new().validate_series(&deduped)?;

        Ok(Self {
            observations: deduped,
        })
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|obs| obs.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|obs| obs.date)
    }

    /// Price recorded exactly on `date`
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |obs| obs.date)
            .ok()
            .map(|idx| self.observations[idx].price)
    }

    /// Most recent price on or before `date`
    pub fn price_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.observations.partition_point(|obs| obs.date <= date);
        idx.checked_sub(1).map(|i| self.observations[i].price)
    }

    /// Observations whose dates fall in `range`
    pub fn between(&self, range: RangeInclusive<NaiveDate>) -> &[PriceObservation] {
        let lo = self
            .observations
            .partition_point(|obs| obs.date < *range.start());
        let hi = self
            .observations
            .partition_point(|obs| obs.date <= *range.end());
        if lo >= hi {
            &[]
        } else {
            &self.observations[lo..hi]
        }
    }
}
