use crate::models::PriceObservation;
use crate::{DcaError, Result};

/// Validates daily price observations for sanity and ordering
pub struct PriceValidator;

impl PriceValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a single observation
    pub fn validate(&self, observation: &PriceObservation) -> Result<()> {
        self.validate_price(observation)?;
        self.validate_volume(observation)?;
        Ok(())
    }

    /// Validate a whole series: every row, then strictly increasing dates
    pub fn validate_series(&self, observations: &[PriceObservation]) -> Result<()> {
        for observation in observations {
            self.validate(observation)?;
        }
        self.validate_ordering(observations)
    }

    fn validate_price(&self, observation: &PriceObservation) -> Result<()> {
        if !observation.price.is_finite() || observation.price <= 0.0 {
            return Err(DcaError::InvalidData(format!(
                "Invalid price on {}: {}",
                observation.date, observation.price
            )));
        }
        Ok(())
    }

    fn validate_volume(&self, observation: &PriceObservation) -> Result<()> {
        // Zero volume is allowed (thin or backfilled days)
        if let Some(volume) = observation.daily_volume {
            if !volume.is_finite() || volume < 0.0 {
                return Err(DcaError::InvalidData(format!(
                    "Invalid volume on {}: {}",
                    observation.date, volume
                )));
            }
        }
        Ok(())
    }

    fn validate_ordering(&self, observations: &[PriceObservation]) -> Result<()> {
        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DcaError::InvalidData(format!(
                    "Dates not strictly increasing: {} then {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        Ok(())
    }
}

impl Default for PriceValidator {
    fn default() -> Self {
        Self::new()
    }
}
