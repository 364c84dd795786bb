use std::ops::Index;

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::compartment::{Compartment, ModelVariant, N_COMPARTMENTS};
use crate::error::SimulacovidError;
use crate::exposed::ExposedEstimate;
use crate::parameters::{PlaceSeverityProfile, PopulationObservation};

/// Sizes of every compartment at one instant, in the fixed [`Compartment`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompartmentState {
    variant: ModelVariant,
    values: [f64; N_COMPARTMENTS],
}

impl CompartmentState {
    /// Wraps raw values, checking the variant's layout and that no entry is negative.
    ///
    /// # Errors
    /// `NegativeState` for the first negative compartment, `InvalidParameter` for a
    /// non-finite entry or an asymptomatic population in the core variant.
    pub fn new(
        variant: ModelVariant,
        values: [f64; N_COMPARTMENTS],
    ) -> Result<Self, SimulacovidError> {
        for compartment in Compartment::iter() {
            let value = values[compartment.index()];
            if !value.is_finite() {
                return Err(SimulacovidError::invalid(format!(
                    "compartment {compartment} is not finite ({value})"
                )));
            }
            if value < 0.0 {
                return Err(SimulacovidError::NegativeState { compartment, value });
            }
        }
        if !variant.has_asymptomatic() && values[Compartment::I0.index()] != 0.0 {
            return Err(SimulacovidError::invalid(
                "the SEIR variant has no asymptomatic compartment",
            ));
        }
        Ok(CompartmentState { variant, values })
    }

    /// Used by the integrator, which checks finiteness itself and must not reject the
    /// tiny negative excursions of a numerical solution.
    pub(crate) fn from_solution(variant: ModelVariant, values: [f64; N_COMPARTMENTS]) -> Self {
        CompartmentState { variant, values }
    }

    #[must_use]
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    #[must_use]
    pub fn get(&self, compartment: Compartment) -> f64 {
        self.values[compartment.index()]
    }

    #[must_use]
    pub fn values(&self) -> &[f64; N_COMPARTMENTS] {
        &self.values
    }

    /// Row sum; equals the total population for a consistent state.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    #[must_use]
    pub fn exposed(&self) -> f64 {
        self.get(Compartment::E0) + self.get(Compartment::E1)
    }

    /// Pre-symptomatic, asymptomatic and mild cases.
    #[must_use]
    pub fn community_infectious(&self) -> f64 {
        self.get(Compartment::E1) + self.get(Compartment::I0) + self.get(Compartment::I1)
    }

    /// Severe and critical cases.
    #[must_use]
    pub fn hospitalized(&self) -> f64 {
        self.get(Compartment::I2) + self.get(Compartment::I3)
    }

    /// Reported `(compartment, value)` pairs for this state's variant.
    pub fn iter(&self) -> impl Iterator<Item = (Compartment, f64)> + '_ {
        self.variant
            .compartments()
            .into_iter()
            .map(|c| (c, self.get(c)))
    }
}

impl Index<Compartment> for CompartmentState {
    type Output = f64;

    fn index(&self, compartment: Compartment) -> &f64 {
        &self.values[compartment.index()]
    }
}

/// Builds the initial state of a cold-start projection.
///
/// Active infections are split across the severity fractions (the core variant merges the
/// asymptomatic share into the mild compartment), recovered and deaths are taken from the
/// observation, and the susceptible population is whatever remains.
///
/// # Errors
/// `NegativeState` when the observation and the exposed estimate leave a negative
/// susceptible population; errors from [`PopulationObservation::validate`].
pub fn build_initial_state(
    observation: &PopulationObservation,
    profile: &PlaceSeverityProfile,
    exposed: &ExposedEstimate,
    variant: ModelVariant,
) -> Result<CompartmentState, SimulacovidError> {
    observation.validate()?;
    let infected = observation.active_infected;

    let (i0, i1) = if variant.has_asymptomatic() {
        (infected * profile.asymptomatic, infected * profile.mild)
    } else {
        (0.0, infected * (profile.asymptomatic + profile.mild))
    };

    let susceptible = observation.population()
        - observation.recovered
        - observation.deaths()
        - infected
        - exposed.total;

    let mut values = [0.0; N_COMPARTMENTS];
    values[Compartment::S.index()] = susceptible;
    values[Compartment::E0.index()] = exposed.latent;
    values[Compartment::E1.index()] = exposed.presymptomatic;
    values[Compartment::I0.index()] = i0;
    values[Compartment::I1.index()] = i1;
    values[Compartment::I2.index()] = infected * profile.severe;
    values[Compartment::I3.index()] = infected * profile.critical;
    values[Compartment::R.index()] = observation.recovered;
    values[Compartment::D.index()] = observation.deaths();

    CompartmentState::new(variant, values)
}
