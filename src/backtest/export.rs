//! CSV and JSON artifacts for the weekly table, transaction logs and sweeps.

use super::sweep::SweepReport;
use crate::models::{Transaction, WeeklyRecord};
use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn opt(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{:.8}", v))
}

// ─── Weekly table ───────────────────────────────────────────────────

/// Write the weekly table as CSV, one row per anchor date
///
/// Columns: anchor_date, weekly_close, weekly_volume, weekly_return,
/// rolling_volatility, moving_average, lower_4sd .. upper_4sd, band,
/// investment_multiple, buy_sell_multiplier. Missing values are empty cells.
pub fn write_weekly_csv<W: Write>(writer: W, records: &[WeeklyRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "anchor_date",
        "weekly_close",
        "weekly_volume",
        "weekly_return",
        "rolling_volatility",
        "moving_average",
        "lower_4sd",
        "lower_3sd",
        "lower_2sd",
        "upper_2sd",
        "upper_3sd",
        "upper_4sd",
        "band",
        "investment_multiple",
        "buy_sell_multiplier",
    ])?;

    for r in records {
        let b = r.bands;
        wtr.write_record([
            r.anchor_date.to_string(),
            opt(r.weekly_close),
            opt(r.weekly_volume),
            opt(r.weekly_return),
            opt(r.rolling_volatility),
            opt(r.moving_average),
            opt(b.map(|b| b.lower_4)),
            opt(b.map(|b| b.lower_3)),
            opt(b.map(|b| b.lower_2)),
            opt(b.map(|b| b.upper_2)),
            opt(b.map(|b| b.upper_3)),
            opt(b.map(|b| b.upper_4)),
            r.band.to_string(),
            format!("{:.8}", r.investment_multiple),
            r.buy_sell_multiplier
                .map_or_else(String::new, |m| m.to_string()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

// ─── Transaction log ────────────────────────────────────────────────

/// Write a strategy's transaction log as CSV
pub fn write_transactions_csv<W: Write>(writer: W, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "date",
        "price",
        "band",
        "requested_amount",
        "amount",
        "units",
        "cumulative_units",
        "cumulative_units_bought",
        "cumulative_units_sold",
        "net_invested",
        "average_cost",
        "rolling_pnl",
        "capital_balance",
    ])?;

    for t in transactions {
        wtr.write_record([
            t.date.to_string(),
            format!("{:.2}", t.price),
            t.band.to_string(),
            format!("{:.2}", t.requested_amount),
            format!("{:.2}", t.amount),
            format!("{:.10}", t.units),
            format!("{:.10}", t.cumulative_units),
            format!("{:.10}", t.cumulative_units_bought),
            format!("{:.10}", t.cumulative_units_sold),
            format!("{:.2}", t.net_invested),
            opt(t.average_cost),
            opt(t.rolling_pnl),
            format!("{:.2}", t.capital_balance),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

// ─── Sweep windows ──────────────────────────────────────────────────

/// Write every simulated window of a sweep as CSV, one row per window
pub fn write_window_outcomes_csv<W: Write>(writer: W, report: &SweepReport) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "duration_weeks",
        "start_date",
        "end_date",
        "optimum_units",
        "optimum_invested",
        "optimum_final_value",
        "optimum_profit_pct",
        "simple_units",
        "simple_invested",
        "simple_final_value",
        "simple_profit_pct",
    ])?;

    for d in &report.durations {
        for w in &d.windows {
            wtr.write_record([
                d.duration_weeks.to_string(),
                w.window.start_date.to_string(),
                w.window.end_date.to_string(),
                format!("{:.10}", w.optimum.total_units),
                format!("{:.2}", w.optimum.net_invested),
                format!("{:.2}", w.optimum.final_value),
                opt(w.optimum.profit_pct),
                format!("{:.10}", w.simple.total_units),
                format!("{:.2}", w.simple.net_invested),
                format!("{:.2}", w.simple.final_value),
                opt(w.simple.profit_pct),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize any report to pretty JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write any report as pretty JSON to `path`
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(to_json(value)?.as_bytes())?;
    tracing::info!("💾 Wrote {}", path.display());
    Ok(())
}

/// Create `path` and hand it to a CSV writer function
pub fn write_csv_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let file = File::create(path)?;
    write(file)?;
    tracing::info!("💾 Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::runner::StrategyState;
    use crate::models::{Band, Bands};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_weekly_csv_blank_cells_for_missing() {
        let mut full = WeeklyRecord::new(day(8), Some(110.0));
        full.weekly_return = Some(0.1);
        full.rolling_volatility = Some(0.05);
        full.moving_average = Some(100.0);
        full.bands = Some(Bands::around(100.0, 0.05));
        full.band = Band::Upper2;
        full.investment_multiple = -0.5;
        full.buy_sell_multiplier = Some(-1);
        let records = vec![WeeklyRecord::new(day(1), None), full];

        let mut buf = Vec::new();
        write_weekly_csv(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("anchor_date,weekly_close"));
        assert!(lines[1].starts_with("2024-01-01,,,"));
        assert!(lines[2].contains("upper_2sd"));
        assert!(lines[2].ends_with(",-1"));
    }

    #[test]
    fn test_transactions_csv_rows() {
        let mut state = StrategyState::new(0.0, true, true);
        state.tick(day(1), 100.0, Band::Within, 250.0).unwrap();
        state.tick(day(8), 125.0, Band::Lower2, 500.0).unwrap();
        let run = state.finalize("Optimum DCA", 125.0, 2);

        let mut buf = Vec::new();
        write_transactions_csv(&mut buf, &run.transactions).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(2).unwrap().contains("lower_2sd"));
    }

    #[test]
    fn test_write_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = WeeklyRecord::new(day(1), Some(42.0));

        write_json(&path, &record).unwrap();
        let loaded: WeeklyRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, record);
    }
}
