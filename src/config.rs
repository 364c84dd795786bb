//! Run configuration, read from a JSON file.
//!
//! ```json
//! {
//!   "disease": { "incubation_period": 5.0, "mild_duration": 6.0 },
//!   "model": "SEAPMDR",
//!   "formula": "royal_society",
//!   "resources_available_proportion": 0.2
//! }
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compartment::ModelVariant;
use crate::error::SimulacovidError;
use crate::formula::FormulaVariant;
use crate::integrator::{Integrator, DEFAULT_HORIZON_DAYS, DEFAULT_STEPS_PER_DAY};
use crate::parameters::DiseaseConstants;

/// Share of reported beds assumed free for new patients.
pub const DEFAULT_RESOURCES_AVAILABLE_PROPORTION: f64 = 0.2;
pub const DEFAULT_SCENARIO: &str = "projection_current_rt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub disease: DiseaseConstants,
    pub horizon_days: usize,
    pub steps_per_day: usize,
    pub formula: FormulaVariant,
    pub model: ModelVariant,
    pub resources_available_proportion: f64,
    pub scenario: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            disease: DiseaseConstants::default(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            steps_per_day: DEFAULT_STEPS_PER_DAY,
            formula: FormulaVariant::default(),
            model: ModelVariant::default(),
            resources_available_proportion: DEFAULT_RESOURCES_AVAILABLE_PROPORTION,
            scenario: DEFAULT_SCENARIO.to_string(),
        }
    }
}

impl SimulationConfig {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    /// `IoError` if the file cannot be read, `JsonError` if it is not a valid
    /// configuration, `ConfigError` if a value is out of range.
    pub fn load(path: &Path) -> Result<Self, SimulacovidError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// # Errors
    /// See [`SimulationConfig::load`].
    pub fn from_json(contents: &str) -> Result<Self, SimulacovidError> {
        let config: SimulationConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `ConfigError` naming the first invalid value.
    pub fn validate(&self) -> Result<(), SimulacovidError> {
        if self.horizon_days == 0 {
            return Err(SimulacovidError::ConfigError(
                "horizon_days must be at least 1".to_string(),
            ));
        }
        if self.steps_per_day == 0 {
            return Err(SimulacovidError::ConfigError(
                "steps_per_day must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.resources_available_proportion) {
            return Err(SimulacovidError::ConfigError(format!(
                "resources_available_proportion must lie in [0, 1], got {}",
                self.resources_available_proportion
            )));
        }
        if self.scenario.is_empty() {
            return Err(SimulacovidError::ConfigError(
                "scenario must not be empty".to_string(),
            ));
        }
        self.disease
            .validate()
            .map_err(|error| SimulacovidError::ConfigError(format!("disease: {error}")))
    }

    #[must_use]
    pub fn integrator(&self) -> Integrator {
        Integrator {
            model: self.model,
            formula: self.formula,
            horizon_days: self.horizon_days,
            steps_per_day: self.steps_per_day,
        }
    }

    /// Scales a reported bed count by the available proportion.
    #[must_use]
    pub fn available(&self, reported: Option<f64>) -> Option<f64> {
        reported
            .filter(|beds| beds.is_finite())
            .map(|beds| beds * self.resources_available_proportion)
    }
}
