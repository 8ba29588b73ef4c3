use crate::data::PriceSeries;
use crate::models::WeeklyRecord;
use crate::{DcaError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// How daily observations collapse into weekly records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationParams {
    /// Weekday each weekly record is anchored to
    pub anchor: Weekday,
    /// Reference "today"; anchors in the unresolved future take the latest known price
    pub today: Option<NaiveDate>,
    /// Surface a missing anchor price as `DcaError::DataGap`
    pub strict_gaps: bool,
}

impl Default for AggregationParams {
    fn default() -> Self {
        Self {
            anchor: Weekday::Mon,
            today: None,
            strict_gaps: false,
        }
    }
}

/// First date on or after `date` that falls on `weekday`
pub fn next_weekday_on_or_after(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() as i64
        - date.weekday().num_days_from_monday() as i64)
        % 7;
    date + Duration::days(ahead)
}

/// Collapse daily prices into one record per anchor week
///
/// # Arguments
/// * `series` - Validated daily price series
/// * `params` - Anchor weekday, optional reference date and gap policy
///
/// # Returns
/// Records with `weekly_close`, `weekly_volume` and `weekly_return` filled in.
/// A missing anchor price leaves the close as `None` (never zero).
pub fn aggregate_weekly(
    series: &PriceSeries,
    params: &AggregationParams,
) -> Result<Vec<WeeklyRecord>> {
    let (first, last) = match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(Vec::new()),
    };

    let in_progress = |anchor: NaiveDate| match params.today {
        Some(today) => today >= anchor - Duration::days(7) && anchor > today,
        None => false,
    };

    let mut records = Vec::new();
    let mut anchor = next_weekday_on_or_after(first, params.anchor);

    while anchor <= last || in_progress(anchor) {
        let close = match params.today {
            Some(today) if in_progress(anchor) => series.price_on_or_before(today),
            _ => series.price_on(anchor),
        };

        if close.is_none() {
            if params.strict_gaps {
                return Err(DcaError::DataGap(anchor));
            }
            tracing::debug!("No price on anchor {}, leaving close empty", anchor);
        }

        let mut record = WeeklyRecord::new(anchor, close);
        record.weekly_volume = weekly_volume(series, anchor);
        records.push(record);

        anchor += Duration::days(7);
    }

    fill_returns(&mut records);
    Ok(records)
}

/// Sum of daily volume over `[anchor - 7, anchor - 1]`
fn weekly_volume(series: &PriceSeries, anchor: NaiveDate) -> Option<f64> {
    let window = series.between(anchor - Duration::days(7)..=anchor - Duration::days(1));
    let volumes: Vec<f64> = window.iter().filter_map(|obs| obs.daily_volume).collect();
    if volumes.is_empty() {
        None
    } else {
        Some(volumes.iter().sum())
    }
}

/// Week-over-week percentage change; defined only when both closes exist
fn fill_returns(records: &mut [WeeklyRecord]) {
    for i in 1..records.len() {
        records[i].weekly_return = match (records[i - 1].weekly_close, records[i].weekly_close) {
            (Some(prev), Some(curr)) if prev > 0.0 => Some(curr / prev - 1.0),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceObservation;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Daily series starting Wednesday 2024-01-03, price = 100 + day index
    fn daily_series(days: i64) -> PriceSeries {
        let start = date(2024, 1, 3);
        PriceSeries::new(
            (0..days)
                .map(|i| {
                    PriceObservation::new(start + Duration::days(i), 100.0 + i as f64)
                        .with_volume(1.0)
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_next_weekday() {
        // 2024-01-03 is a Wednesday
        assert_eq!(
            next_weekday_on_or_after(date(2024, 1, 3), Weekday::Mon),
            date(2024, 1, 8)
        );
        assert_eq!(
            next_weekday_on_or_after(date(2024, 1, 8), Weekday::Mon),
            date(2024, 1, 8)
        );
        assert_eq!(
            next_weekday_on_or_after(date(2024, 1, 3), Weekday::Wed),
            date(2024, 1, 3)
        );
    }

    #[test]
    fn test_anchors_and_closes() {
        let series = daily_series(30); // 2024-01-03 .. 2024-02-01
        let records = aggregate_weekly(&series, &AggregationParams::default()).unwrap();

        let anchors: Vec<_> = records.iter().map(|r| r.anchor_date).collect();
        assert_eq!(
            anchors,
            vec![
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22),
                date(2024, 1, 29)
            ]
        );
        // 2024-01-08 is day index 5
        assert_eq!(records[0].weekly_close, Some(105.0));
        assert_eq!(records[1].weekly_close, Some(112.0));
    }

    #[test]
    fn test_returns_and_volume() {
        let series = daily_series(30);
        let records = aggregate_weekly(&series, &AggregationParams::default()).unwrap();

        assert_eq!(records[0].weekly_return, None);
        let expected = 112.0 / 105.0 - 1.0;
        assert!((records[1].weekly_return.unwrap() - expected).abs() < 1e-12);

        // First week only has 01-03 .. 01-07 in its volume window
        assert_eq!(records[0].weekly_volume, Some(5.0));
        assert_eq!(records[1].weekly_volume, Some(7.0));
    }

    #[test]
    fn test_missing_anchor_propagates() {
        let start = date(2024, 1, 1);
        let obs: Vec<_> = (0..21)
            .map(|i| PriceObservation::new(start + Duration::days(i), 50.0))
            .filter(|o| o.date != date(2024, 1, 8))
            .collect();
        let series = PriceSeries::new(obs).unwrap();

        let records = aggregate_weekly(&series, &AggregationParams::default()).unwrap();
        assert_eq!(records[1].anchor_date, date(2024, 1, 8));
        assert_eq!(records[1].weekly_close, None);
        assert_eq!(records[1].weekly_return, None);
        assert_eq!(records[2].weekly_return, None);
    }

    #[test]
    fn test_strict_gap_errors() {
        let obs = vec![
            PriceObservation::new(date(2024, 1, 1), 50.0),
            PriceObservation::new(date(2024, 1, 9), 51.0),
        ];
        let series = PriceSeries::new(obs).unwrap();
        let params = AggregationParams {
            strict_gaps: true,
            ..Default::default()
        };
        let err = aggregate_weekly(&series, &params).unwrap_err();
        assert!(matches!(err, DcaError::DataGap(d) if d == date(2024, 1, 8)));
    }

    #[test]
    fn test_in_progress_week_uses_latest_price() {
        let series = daily_series(10); // 2024-01-03 .. 2024-01-12 (Friday)
        let params = AggregationParams {
            today: Some(date(2024, 1, 12)),
            ..Default::default()
        };
        let records = aggregate_weekly(&series, &params).unwrap();

        let last = records.last().unwrap();
        assert_eq!(last.anchor_date, date(2024, 1, 15));
        assert_eq!(last.weekly_close, Some(109.0));
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::default();
        let records = aggregate_weekly(&series, &AggregationParams::default()).unwrap();
        assert!(records.is_empty());
    }
}
