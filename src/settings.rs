use crate::error::{ProjectionError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Limits and defaults for balance queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProjectionSettings {
    #[schemars(description = "Largest number of recorded points a series may contain")]
    pub max_series_points: usize,

    #[schemars(
        description = "Largest number of unrecorded warm-up points; the warm-up step is coarsened to stay within it"
    )]
    pub max_warmup_points: usize,

    #[schemars(description = "Series step when the caller does not give one")]
    pub default_step_days: u32,

    pub min_step_days: u32,

    pub max_step_days: u32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            max_series_points: 420,
            max_warmup_points: 420,
            default_step_days: 7,
            min_step_days: 1,
            max_step_days: 366,
        }
    }
}

impl ProjectionSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: ProjectionSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_series_points == 0 {
            return Err(ProjectionError::InvalidSettings(
                "max_series_points must be at least 1".to_string(),
            ));
        }
        if self.max_warmup_points < 2 {
            return Err(ProjectionError::InvalidSettings(
                "max_warmup_points must be at least 2".to_string(),
            ));
        }
        if self.min_step_days == 0 || self.min_step_days > self.max_step_days {
            return Err(ProjectionError::InvalidSettings(format!(
                "step bounds {}..{} are not a valid range",
                self.min_step_days, self.max_step_days
            )));
        }
        if !(self.min_step_days..=self.max_step_days).contains(&self.default_step_days) {
            return Err(ProjectionError::InvalidSettings(format!(
                "default_step_days {} is outside {}..{}",
                self.default_step_days, self.min_step_days, self.max_step_days
            )));
        }
        Ok(())
    }
}
