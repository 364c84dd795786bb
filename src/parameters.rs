//! Immutable inputs of a projection: observed population counts, place-specific severity
//! fractions and the fixed epidemiological constants of the disease.

use serde::{Deserialize, Serialize};

use crate::error::SimulacovidError;

/// Tolerance used when checking that severity fractions sum to one.
pub const FRACTION_SUM_TOLERANCE: f64 = 1e-6;

/// Observed population counts for a place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationObservation {
    pub total_population: u64,
    pub active_infected: f64,
    pub deaths: u64,
    /// Zero when unknown.
    #[serde(default)]
    pub recovered: f64,
}

impl PopulationObservation {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn population(&self) -> f64 {
        self.total_population as f64
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn deaths(&self) -> f64 {
        self.deaths as f64
    }

    /// Checks that counts are finite, non-negative and fit in the population.
    ///
    /// # Errors
    /// `InvalidParameter` if any check fails.
    pub fn validate(&self) -> Result<(), SimulacovidError> {
        for (name, value) in [
            ("active_infected", self.active_infected),
            ("recovered", self.recovered),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulacovidError::invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        let occupied = self.active_infected + self.deaths() + self.recovered;
        if occupied > self.population() {
            return Err(SimulacovidError::invalid(format!(
                "infected, deaths and recovered ({occupied}) exceed the population ({})",
                self.total_population
            )));
        }
        Ok(())
    }
}

/// Place-specific severity distribution of cases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaceSeverityProfile {
    #[serde(alias = "i0_percentage")]
    pub asymptomatic: f64,
    #[serde(alias = "i1_percentage")]
    pub mild: f64,
    #[serde(alias = "i2_percentage")]
    pub severe: f64,
    #[serde(alias = "i3_percentage")]
    pub critical: f64,
    pub fatality_ratio: f64,
    #[serde(default)]
    pub nosocomial_proportion: Option<f64>,
}

impl PlaceSeverityProfile {
    /// # Errors
    /// `InvalidParameter` if a fraction lies outside `[0, 1]`, the severity fractions do not
    /// sum to one, or the nosocomial proportion lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), SimulacovidError> {
        let fractions = [
            ("asymptomatic", self.asymptomatic),
            ("mild", self.mild),
            ("severe", self.severe),
            ("critical", self.critical),
            ("fatality_ratio", self.fatality_ratio),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulacovidError::invalid(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        let sum = self.asymptomatic + self.mild + self.severe + self.critical;
        if (sum - 1.0).abs() > FRACTION_SUM_TOLERANCE {
            return Err(SimulacovidError::invalid(format!(
                "severity fractions must sum to 1, got {sum}"
            )));
        }
        if let Some(p) = self.nosocomial_proportion {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimulacovidError::invalid(format!(
                    "nosocomial_proportion must lie in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// Fixed epidemiological constants. Durations are in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiseaseConstants {
    pub presymptomatic_period: f64,
    pub incubation_period: f64,
    pub asymptomatic_duration: f64,
    pub mild_duration: f64,
    pub severe_duration: f64,
    pub critical_duration: f64,
    pub asymptomatic_proportion: f64,
    pub infected_health_care_proportion: f64,
}

impl Default for DiseaseConstants {
    fn default() -> Self {
        DiseaseConstants {
            presymptomatic_period: 2.0,
            incubation_period: 5.0,
            asymptomatic_duration: 6.0,
            mild_duration: 6.0,
            severe_duration: 6.0,
            critical_duration: 8.0,
            asymptomatic_proportion: 0.4,
            infected_health_care_proportion: 0.05,
        }
    }
}

impl DiseaseConstants {
    /// # Errors
    /// `InvalidParameter` if a duration is not positive, the incubation period does not
    /// exceed the pre-symptomatic period, or a proportion is out of range.
    pub fn validate(&self) -> Result<(), SimulacovidError> {
        let durations = [
            ("presymptomatic_period", self.presymptomatic_period),
            ("incubation_period", self.incubation_period),
            ("asymptomatic_duration", self.asymptomatic_duration),
            ("mild_duration", self.mild_duration),
            ("severe_duration", self.severe_duration),
            ("critical_duration", self.critical_duration),
        ];
        for (name, value) in durations {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimulacovidError::invalid(format!(
                    "{name} must be a positive number of days, got {value}"
                )));
            }
        }
        if self.incubation_period <= self.presymptomatic_period {
            return Err(SimulacovidError::invalid(format!(
                "incubation_period ({}) must exceed presymptomatic_period ({})",
                self.incubation_period, self.presymptomatic_period
            )));
        }
        if !(0.0..=1.0).contains(&self.asymptomatic_proportion) {
            return Err(SimulacovidError::invalid(format!(
                "asymptomatic_proportion must lie in [0, 1], got {}",
                self.asymptomatic_proportion
            )));
        }
        let p = self.infected_health_care_proportion;
        if !(0.0..=1.0).contains(&p) {
            return Err(SimulacovidError::invalid(format!(
                "infected_health_care_proportion must lie in [0, 1], got {p}"
            )));
        }
        Ok(())
    }

    /// Length of the latent (non-infectious) part of the incubation period.
    #[must_use]
    pub fn latent_period(&self) -> f64 {
        self.incubation_period - self.presymptomatic_period
    }

    /// Severity-weighted mean time an infection spends infectious, counting the
    /// pre-symptomatic phase and every stage a case of each severity passes through.
    #[must_use]
    pub fn average_infectious_duration(&self, profile: &PlaceSeverityProfile) -> f64 {
        let t_e1 = self.presymptomatic_period;
        let t_i0 = self.asymptomatic_duration;
        let t_i1 = self.mild_duration;
        let t_i2 = self.severe_duration;
        let t_i3 = self.critical_duration;
        profile.asymptomatic * (t_e1 + t_i0)
            + profile.mild * (t_e1 + t_i1)
            + profile.severe * (t_e1 + t_i1 + t_i2)
            + profile.critical * (t_e1 + t_i1 + t_i2 + t_i3)
    }
}

/// Validates a reproduction number.
///
/// # Errors
/// `InvalidParameter` unless `rt` is finite and strictly positive.
pub fn check_reproduction_number(rt: f64) -> Result<f64, SimulacovidError> {
    if rt.is_finite() && rt > 0.0 {
        Ok(rt)
    } else {
        Err(SimulacovidError::invalid(format!(
            "reproduction number must be positive, got {rt}"
        )))
    }
}
