use super::series::PriceSeries;
use crate::models::PriceObservation;
use crate::{DcaError, Result};
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m-%d-%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Load a daily price CSV from disk
///
/// Expected columns (case-insensitive): `date`, `price` (or `close`), and an
/// optional `daily_volume` (or `volume`).
pub fn load_prices_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let path = path.as_ref();
    tracing::info!("📂 Loading prices from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_prices_csv(file)
}

/// Parse a daily price CSV from any reader
///
/// Rows with an unparseable date or a non-positive price are dropped with a
/// warning; an input with no usable rows is an error.
pub fn read_prices_csv<R: Read>(reader: R) -> Result<PriceSeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };

    let date_col = find(&["date", "timestamp"])
        .ok_or_else(|| DcaError::InvalidData("missing 'date' column".to_string()))?;
    let price_col = find(&["price", "close"])
        .ok_or_else(|| DcaError::InvalidData("missing 'price' column".to_string()))?;
    let volume_col = find(&["daily_volume", "volume"]);

    let mut observations = Vec::new();
    let mut dropped = 0usize;

    for record in csv_reader.records() {
        let record = record?;
        let date = record.get(date_col).and_then(parse_date);
        let price = record.get(price_col).and_then(parse_number);

        let (date, price) = match (date, price) {
            (Some(date), Some(price)) if price > 0.0 => (date, price),
            _ => {
                dropped += 1;
                continue;
            }
        };

        let daily_volume = volume_col
            .and_then(|col| record.get(col))
            .and_then(parse_number)
            .filter(|v| *v >= 0.0);

        observations.push(PriceObservation {
            date,
            price,
            daily_volume,
        });
    }

    if dropped > 0 {
        tracing::warn!("⚠️  Dropped {} unusable price rows", dropped);
    }

    if observations.is_empty() {
        return Err(DcaError::InsufficientHistory { needed: 1, got: 0 });
    }

    let series = PriceSeries::new(observations)?;
    tracing::info!(
        "✅ Loaded {} daily prices ({:?} → {:?})",
        series.len(),
        series.first_date(),
        series.last_date()
    );
    Ok(series)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Tolerate a trailing time component
    let raw = raw.split([' ', 'T']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
