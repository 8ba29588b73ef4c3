use std::ops::Range;

/// Index range used at row `i` for a growing-then-rolling lookback
///
/// Rows before `lookback - 1` use everything from the start; afterwards
/// exactly the trailing `lookback` rows.
pub fn lookback_range(i: usize, lookback: usize) -> Range<usize> {
    let end = i + 1;
    end.saturating_sub(lookback)..end
}

/// Sample standard deviation (n - 1); needs at least two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Rolling sample volatility of weekly returns, missing values skipped
pub fn rolling_volatility(returns: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    (0..returns.len())
        .map(|i| {
            let window: Vec<f64> = returns[lookback_range(i, lookback)]
                .iter()
                .flatten()
                .copied()
                .collect();
            sample_std(&window)
        })
        .collect()
}

/// Rolling simple mean of weekly closes, missing values skipped
pub fn rolling_mean(closes: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            let window: Vec<f64> = closes[lookback_range(i, lookback)]
                .iter()
                .flatten()
                .copied()
                .collect();
            if window.is_empty() {
                None
            } else {
                Some(window.iter().sum::<f64>() / window.len() as f64)
            }
        })
        .collect()
}

/// Rolling volume-weighted average price
///
/// Only rows where both close and volume are present contribute; undefined
/// when the volume in the window sums to zero.
pub fn rolling_vwap(
    closes: &[Option<f64>],
    volumes: &[Option<f64>],
    lookback: usize,
) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            let range = lookback_range(i, lookback);
            let (weighted, total) = closes[range.clone()]
                .iter()
                .zip(&volumes[range])
                .filter_map(|(c, v)| Some((c.as_ref()?, v.as_ref()?)))
                .fold((0.0, 0.0), |(w, t), (c, v)| (w + c * v, t + v));
            if total > 0.0 {
                Some(weighted / total)
            } else {
                None
            }
        })
        .collect()
}
