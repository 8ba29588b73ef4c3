//! Layered settings: built-in defaults, an optional TOML file, then
//! `DCA__SECTION__KEY` environment overrides.

use crate::backtest::{ComparisonParams, SamplingMode, SimulationParams, SweepParams, TableParams};
use crate::indicators::{AggregationParams, MovingAverageKind};
use crate::models::Window;
use crate::stats::CorrectionMethod;
use crate::{DcaError, Result};
use chrono::{NaiveDate, Weekday};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "optimum-dca";
pub const ENV_PREFIX: &str = "DCA";

/// Single-window simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub weekly_budget: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub final_price: Option<f64>,
    pub band_lookback_weeks: usize,
    pub moving_average: MovingAverageKind,
    pub anchor_weekday: Weekday,
    pub unlimited_capital: bool,
    pub allow_negative_investment: bool,
    pub entry_drift_adjustment: bool,
    pub strict_gaps: bool,
    /// Reference date for the in-progress week; unset treats history as complete
    pub today: Option<NaiveDate>,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            weekly_budget: 250.0,            // $250 per week
            start_date: None,                // first date in the data
            end_date: None,                  // last date in the data
            final_price: None,               // last price on or before end
            band_lookback_weeks: 14,         // ~one quarter
            moving_average: MovingAverageKind::Simple,
            anchor_weekday: Weekday::Mon,
            unlimited_capital: true,         // balance may go negative
            allow_negative_investment: true, // upper bands sell
            entry_drift_adjustment: false,
            strict_gaps: false,              // missing anchors become neutral weeks
            today: None,
        }
    }
}

/// Multi-window sweep and statistics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub overall_start: Option<NaiveDate>,
    pub overall_end: Option<NaiveDate>,
    pub durations_weeks: Vec<u32>,
    pub sampling: SamplingMode,
    pub rolling_step_weeks: u32,
    pub risk_free_rate: f64,
    pub confidence: f64,
    pub n_bootstrap: usize,
    pub seed: u64,
    pub correction: CorrectionMethod,
    pub autocorrelation_lags: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            overall_start: None,
            overall_end: None,
            durations_weeks: vec![52, 104, 156, 208], // 1-4 years
            sampling: SamplingMode::Rolling,
            rolling_step_weeks: 4, // monthly step
            risk_free_rate: 0.04,  // 4% annual
            confidence: 0.95,
            n_bootstrap: 2000,
            seed: 42,
            correction: CorrectionMethod::Holm,
            autocorrelation_lags: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backtest: BacktestSettings,
    pub analysis: AnalysisSettings,
}

impl Settings {
    /// Load settings from defaults, a config file and the environment
    ///
    /// # Arguments
    /// * `path` - Explicit config file (must exist); `None` looks for an
    ///   optional `optimum-dca.{toml,json,yaml}` in the working directory
    ///
    /// # Returns
    /// Validated settings
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::from_sources(file, env)
    }

    fn from_sources<F>(file: F, env: Environment) -> Result<Self>
    where
        F: ::config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let b = &self.backtest;
        let a = &self.analysis;

        if !b.weekly_budget.is_finite() || b.weekly_budget < 0.0 {
            return Err(DcaError::Configuration(format!(
                "backtest.weekly_budget must be >= 0, got {}",
                b.weekly_budget
            )));
        }
        if b.band_lookback_weeks == 0 {
            return Err(DcaError::Configuration(
                "backtest.band_lookback_weeks must be at least 1".to_string(),
            ));
        }
        if let Some(price) = b.final_price {
            if !price.is_finite() || price <= 0.0 {
                return Err(DcaError::Configuration(format!(
                    "backtest.final_price must be positive, got {}",
                    price
                )));
            }
        }
        if let (Some(start), Some(end)) = (a.overall_start, a.overall_end) {
            if end < start {
                return Err(DcaError::Configuration(format!(
                    "analysis.overall_end {} is before overall_start {}",
                    end, start
                )));
            }
        }
        if a.durations_weeks.is_empty() || a.durations_weeks.contains(&0) {
            return Err(DcaError::Configuration(
                "analysis.durations_weeks must be non-empty and positive".to_string(),
            ));
        }
        if a.rolling_step_weeks == 0 {
            return Err(DcaError::Configuration(
                "analysis.rolling_step_weeks must be at least 1".to_string(),
            ));
        }
        if !(a.confidence > 0.0 && a.confidence < 1.0) {
            return Err(DcaError::Configuration(format!(
                "analysis.confidence must be in (0, 1), got {}",
                a.confidence
            )));
        }
        Ok(())
    }

    pub fn table_params(&self) -> TableParams {
        TableParams {
            aggregation: AggregationParams {
                anchor: self.backtest.anchor_weekday,
                today: self.backtest.today,
                strict_gaps: self.backtest.strict_gaps,
            },
            band_lookback_weeks: self.backtest.band_lookback_weeks,
            moving_average: self.backtest.moving_average,
        }
    }

    /// Single-run window, falling back to the data range for unset dates
    ///
    /// An end before the start is kept as-is and simulates zero weeks.
    pub fn backtest_window(&self, data_start: NaiveDate, data_end: NaiveDate) -> Window {
        let start = self.backtest.start_date.unwrap_or(data_start);
        let end = self.backtest.end_date.unwrap_or(data_end);
        let days = ((end - start).num_days() + 1).max(0);
        Window::new(start, end, ((days + 6) / 7) as u32)
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            weekly_budget: self.backtest.weekly_budget,
            unlimited_capital: self.backtest.unlimited_capital,
            allow_negative_investment: self.backtest.allow_negative_investment,
            entry_drift_adjustment: self.backtest.entry_drift_adjustment,
            final_price: self.backtest.final_price,
        }
    }

    pub fn comparison_params(&self) -> ComparisonParams {
        ComparisonParams {
            risk_free_rate: self.analysis.risk_free_rate,
            confidence: self.analysis.confidence,
            n_bootstrap: self.analysis.n_bootstrap,
            seed: self.analysis.seed,
            autocorrelation_lags: self.analysis.autocorrelation_lags,
        }
    }

    /// Sweep parameters, falling back to the data range for unset bounds
    pub fn sweep_params(&self, data_start: NaiveDate, data_end: NaiveDate) -> SweepParams {
        SweepParams {
            overall_start: self.analysis.overall_start.unwrap_or(data_start),
            overall_end: self.analysis.overall_end.unwrap_or(data_end),
            durations_weeks: self.analysis.durations_weeks.clone(),
            sampling: self.analysis.sampling,
            rolling_step_weeks: self.analysis.rolling_step_weeks,
            correction: self.analysis.correction,
            comparison: self.comparison_params(),
        }
    }
}
