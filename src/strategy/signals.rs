use crate::indicators::GlobalStats;
use crate::models::{Band, Bands, WeeklyRecord};

type BandTest = fn(f64, &Bands) -> bool;

/// Band membership tests, checked deepest shell first
///
/// The first matching entry wins, so a close below `lower_4` is classified
/// `Lower4` even though it is also below `lower_3` and `lower_2`.
const BAND_ORDER: [(BandTest, Band); 6] = [
    (|p, b| p < b.lower_4, Band::Lower4),
    (|p, b| p < b.lower_3, Band::Lower3),
    (|p, b| p < b.lower_2, Band::Lower2),
    (|p, b| p > b.upper_4, Band::Upper4),
    (|p, b| p > b.upper_3, Band::Upper3),
    (|p, b| p > b.upper_2, Band::Upper2),
];

/// Classify a weekly close against its bands
pub fn classify_band(price: f64, bands: &Bands) -> Band {
    BAND_ORDER
        .iter()
        .find(|(test, _)| test(price, bands))
        .map(|(_, band)| *band)
        .unwrap_or(Band::Within)
}

/// Continuous investment multiple for a classified week
///
/// Lower kσ: `1 + k|r| + (1 + s) + vol`. Upper kσ: `1 - k|r| - (1 + s) - vol`.
/// Within the bands the multiple is exactly 1.
pub fn investment_multiple(band: Band, weekly_return: f64, volatility: f64, sensitivity: f64) -> f64 {
    let k = match band.sigma() {
        Some(k) => k as f64,
        None => return 1.0,
    };
    let push = k * weekly_return.abs() + (1.0 + sensitivity) + volatility;
    if band.is_lower() {
        1.0 + push
    } else {
        1.0 - push
    }
}

/// Discrete buy/sell multiplier: `+k` for a lower shell, `-k` for an upper one
///
/// `None` when the multiple is exactly 1 or its sign disagrees with the shell.
pub fn buy_sell_multiplier(band: Band, multiple: f64) -> Option<i8> {
    if multiple == 1.0 {
        return None;
    }
    let k = band.sigma()? as i8;
    if band.is_lower() && multiple > 1.0 {
        Some(k)
    } else if band.is_upper() && multiple < 0.0 {
        Some(-k)
    } else {
        None
    }
}

/// Fill band, investment multiple and buy/sell multiplier for every record
///
/// A week missing its close, return, volatility or bands stays neutral
/// (`Within`, multiple 1, no multiplier).
pub fn annotate_signals(records: &mut [WeeklyRecord], stats: &GlobalStats) {
    for record in records.iter_mut() {
        let inputs = (
            record.weekly_close,
            record.weekly_return,
            record.rolling_volatility,
            record.bands,
        );
        let (price, ret, vol, bands) = match inputs {
            (Some(p), Some(r), Some(v), Some(b)) => (p, r, v, b),
            _ => {
                record.band = Band::Within;
                record.investment_multiple = 1.0;
                record.buy_sell_multiplier = None;
                continue;
            }
        };

        let band = classify_band(price, &bands);
        let multiple = investment_multiple(band, ret, vol, stats.sensitivity);
        record.band = band;
        record.investment_multiple = multiple;
        record.buy_sell_multiplier = buy_sell_multiplier(band, multiple);

        if band != Band::Within {
            tracing::debug!(
                "{} close {:.2} in {} (multiple {:.4})",
                record.anchor_date,
                price,
                band,
                multiple
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> Bands {
        // ma = 100, vol = 0.05 → 80 / 85 / 90 | 110 / 115 / 120
        Bands::around(100.0, 0.05)
    }

    #[test]
    fn test_classify_deepest_first() {
        let b = bands();
        assert_eq!(classify_band(79.0, &b), Band::Lower4);
        assert_eq!(classify_band(84.0, &b), Band::Lower3);
        assert_eq!(classify_band(89.0, &b), Band::Lower2);
        assert_eq!(classify_band(100.0, &b), Band::Within);
        assert_eq!(classify_band(111.0, &b), Band::Upper2);
        assert_eq!(classify_band(116.0, &b), Band::Upper3);
        assert_eq!(classify_band(121.0, &b), Band::Upper4);
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        let b = bands();
        assert_eq!(classify_band(b.lower_2, &b), Band::Within);
        assert_eq!(classify_band(b.lower_4, &b), Band::Lower3);
        assert_eq!(classify_band(b.upper_2, &b), Band::Within);
    }

    #[test]
    fn test_investment_multiple_lower() {
        // 1 + 4*0.1 + (1 + 0.05) + 0.02
        let m = investment_multiple(Band::Lower4, -0.1, 0.02, 0.05);
        assert!((m - 2.47).abs() < 1e-12);
    }

    #[test]
    fn test_investment_multiple_upper() {
        // 1 - 2*0.1 - (1 + 0.05) - 0.02
        let m = investment_multiple(Band::Upper2, 0.1, 0.02, 0.05);
        assert!((m - (-0.27)).abs() < 1e-12);
    }

    #[test]
    fn test_within_is_exactly_one() {
        assert_eq!(investment_multiple(Band::Within, 0.3, 0.2, 0.1), 1.0);
        assert_eq!(buy_sell_multiplier(Band::Within, 1.0), None);
    }

    #[test]
    fn test_buy_sell_multiplier() {
        assert_eq!(buy_sell_multiplier(Band::Lower3, 2.5), Some(3));
        assert_eq!(buy_sell_multiplier(Band::Upper4, -1.2), Some(-4));
        assert_eq!(buy_sell_multiplier(Band::Upper2, 0.0), None);
    }

    #[test]
    fn test_annotate_neutral_when_inputs_missing() {
        use chrono::NaiveDate;
        let mut records = vec![WeeklyRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Some(50.0),
        )];
        records[0].investment_multiple = 9.0;
        annotate_signals(&mut records, &GlobalStats::empty());
        assert_eq!(records[0].band, Band::Within);
        assert_eq!(records[0].investment_multiple, 1.0);
        assert_eq!(records[0].buy_sell_multiplier, None);
    }

    #[test]
    fn test_annotate_classifies() {
        use chrono::NaiveDate;
        let mut rec = WeeklyRecord::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), Some(70.0));
        rec.weekly_return = Some(-0.2);
        rec.rolling_volatility = Some(0.05);
        rec.moving_average = Some(100.0);
        rec.bands = Some(bands());
        let mut records = vec![rec];

        let stats = GlobalStats {
            sensitivity: 0.1,
            ..GlobalStats::empty()
        };
        annotate_signals(&mut records, &stats);

        assert_eq!(records[0].band, Band::Lower4);
        // 1 + 0.8 + 1.1 + 0.05
        assert!((records[0].investment_multiple - 2.95).abs() < 1e-12);
        assert_eq!(records[0].buy_sell_multiplier, Some(4));
    }
}
