//! Simulation settings

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::SIM_TIMESTEP;

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Time step
    pub dt: f64,

    /// Simulated time for a run, if fixed
    pub duration: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dt: SIM_TIMESTEP,
            duration: None,
        }
    }
}

impl Settings {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a JSON settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(Error::Settings(format!(
                "timestep must be positive and finite, got {}",
                self.dt
            )));
        }
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(Error::Settings(format!(
                    "duration must be non-negative and finite, got {duration}"
                )));
            }
        }
        Ok(())
    }

    /// Whole steps covering `duration`, rounded to nearest; 0 without one
    pub fn steps(&self) -> u64 {
        match self.duration {
            Some(duration) => (duration / self.dt).round() as u64,
            None => 0,
        }
    }
}
