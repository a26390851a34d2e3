//! Density classification of raw zone detection counts.

use crate::error::MonitorError;
use common::crowd::DensityLevel;
use serde::{Deserialize, Serialize};

/// Classification thresholds. Configuration, not constants, so operators can
/// tune per facility. `critical_ceiling` is the facility-wide limit above
/// which a count is classified `Critical`, distinct from the 3-bucket raw
/// classification used for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityThresholds {
    /// Counts above this are at least Medium
    #[serde(default = "default_medium")]
    pub medium: u64,

    /// Counts above this are at least High
    #[serde(default = "default_high")]
    pub high: u64,

    /// Facility-wide ceiling; counts above this are Critical
    #[serde(default = "default_critical_ceiling")]
    pub critical_ceiling: u64,
}

fn default_medium() -> u64 {
    50
}

fn default_high() -> u64 {
    100
}

fn default_critical_ceiling() -> u64 {
    250
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            medium: default_medium(),
            high: default_high(),
            critical_ceiling: default_critical_ceiling(),
        }
    }
}

impl DensityThresholds {
    /// Thresholds must be ordered or classification stops being monotonic.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.medium > self.high || self.high > self.critical_ceiling {
            return Err(MonitorError::InvalidInput(format!(
                "density thresholds must satisfy medium <= high <= critical_ceiling (got {} / {} / {})",
                self.medium, self.high, self.critical_ceiling
            )));
        }
        Ok(())
    }

    /// Deterministic, pure and total over non-negative counts. Negative
    /// counts are rejected; there are no other failure modes.
    pub fn classify(&self, count: i64) -> Result<DensityLevel, MonitorError> {
        if count < 0 {
            return Err(MonitorError::InvalidInput(format!(
                "detection count must be non-negative (got {})",
                count
            )));
        }
        let count = count as u64;

        Ok(if count > self.critical_ceiling {
            DensityLevel::Critical
        } else if count > self.high {
            DensityLevel::High
        } else if count > self.medium {
            DensityLevel::Medium
        } else {
            DensityLevel::Low
        })
    }
}
