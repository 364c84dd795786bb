//! Forward integration of the compartmental model over a fixed day grid.
//!
//! A cold start builds the initial state and the rates from observations:
//! exposed estimate, then initial state, then rates. A continuation starts from a state
//! computed by an earlier phase and only derives new rates for the phase's reproduction
//! number. The total population is never carried separately; it is the row sum of the
//! state.

use log::trace;
use strum::IntoEnumIterator;

use crate::compartment::{Compartment, ModelVariant, N_COMPARTMENTS};
use crate::error::SimulacovidError;
use crate::exposed::estimate_exposed;
use crate::formula::FormulaVariant;
use crate::model::derivatives;
use crate::numeric::first_non_finite;
use crate::ode::Rk4;
use crate::parameters::{DiseaseConstants, PlaceSeverityProfile, PopulationObservation};
use crate::rates::{derive_rates, DerivedRates};
use crate::state::{build_initial_state, CompartmentState};
use crate::trajectory::Trajectory;

/// Days projected by default.
pub const DEFAULT_HORIZON_DAYS: usize = 90;
/// RK4 steps per day by default.
pub const DEFAULT_STEPS_PER_DAY: usize = 10;

/// Where an integration starts from.
#[derive(Debug, Clone, Copy)]
pub enum Start {
    /// Build everything from observed counts.
    Cold(PopulationObservation),
    /// Resume from a previously projected state.
    Continuation(CompartmentState),
}

/// The initial state and rates of one run, ready to integrate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedRun {
    pub initial: CompartmentState,
    pub rates: DerivedRates,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    pub model: ModelVariant,
    pub formula: FormulaVariant,
    pub horizon_days: usize,
    pub steps_per_day: usize,
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator {
            model: ModelVariant::default(),
            formula: FormulaVariant::default(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            steps_per_day: DEFAULT_STEPS_PER_DAY,
        }
    }
}

impl Integrator {
    #[must_use]
    pub fn new(model: ModelVariant, formula: FormulaVariant) -> Self {
        Integrator {
            model,
            formula,
            ..Integrator::default()
        }
    }

    /// Derives the initial state (cold start only) and the rates for `rt`.
    ///
    /// # Errors
    /// Any estimation or derivation error; a continuation state of another model variant
    /// is an `InvalidParameter`.
    pub fn prepare(
        &self,
        start: &Start,
        profile: &PlaceSeverityProfile,
        constants: &DiseaseConstants,
        rt: f64,
    ) -> Result<PreparedRun, SimulacovidError> {
        let formula = self.formula.formula();
        let initial = match start {
            Start::Cold(observation) => {
                let exposed =
                    estimate_exposed(observation.active_infected, profile, constants, rt, formula)?;
                build_initial_state(observation, profile, &exposed, self.model)?
            }
            Start::Continuation(state) => {
                if state.variant() != self.model {
                    return Err(SimulacovidError::invalid(format!(
                        "cannot continue a {} state with the {} model",
                        state.variant(),
                        self.model
                    )));
                }
                *state
            }
        };
        let rates = derive_rates(profile, constants, rt, &initial, formula)?;
        Ok(PreparedRun { initial, rates })
    }

    /// Integrates a prepared run over the horizon.
    ///
    /// # Errors
    /// `SolverFailure` as soon as any compartment becomes non-finite.
    pub fn run(&self, prepared: &PreparedRun, scenario: &str) -> Result<Trajectory, SimulacovidError> {
        if self.steps_per_day == 0 {
            return Err(SimulacovidError::invalid("steps_per_day must be at least 1"));
        }
        let rates = &prepared.rates;
        let mut y: [f64; N_COMPARTMENTS] = *prepared.initial.values();
        let mut rk4 = Rk4::<N_COMPARTMENTS>::new();
        let mut days = Vec::with_capacity(self.horizon_days + 1);
        days.push(prepared.initial);

        for day in 1..=self.horizon_days {
            #[allow(clippy::cast_precision_loss)]
            let t0 = (day - 1) as f64;
            rk4.advance_unit(&mut y, t0, self.steps_per_day, |_, y, dy| {
                derivatives(rates, y, dy);
            });
            if let Some(index) = first_non_finite(&y) {
                return Err(SimulacovidError::SolverFailure {
                    day,
                    compartment: compartment_at(index),
                });
            }
            days.push(CompartmentState::from_solution(self.model, y));
        }
        trace!(
            "{scenario}: integrated {} days, final deaths {:.2}",
            self.horizon_days,
            y[Compartment::D.index()]
        );
        Ok(Trajectory::new(scenario.to_string(), self.model, days))
    }

    /// Prepares and runs in one call.
    ///
    /// # Errors
    /// See [`Integrator::prepare`] and [`Integrator::run`].
    pub fn integrate(
        &self,
        start: &Start,
        profile: &PlaceSeverityProfile,
        constants: &DiseaseConstants,
        rt: f64,
        scenario: &str,
    ) -> Result<Trajectory, SimulacovidError> {
        let prepared = self.prepare(start, profile, constants, rt)?;
        self.run(&prepared, scenario)
    }
}

fn compartment_at(index: usize) -> Compartment {
    Compartment::iter().nth(index).unwrap_or(Compartment::S)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_relative_eq;
    use crate::numeric::CONSERVATION_TOLERANCE;
    use crate::parameters::tests::{sample_observation, sample_profile};

    fn cold(model: ModelVariant, rt: f64) -> Trajectory {
        Integrator::new(model, FormulaVariant::RoyalSociety)
            .integrate(
                &Start::Cold(sample_observation()),
                &sample_profile(),
                &DiseaseConstants::default(),
                rt,
                "projection_current_rt",
            )
            .unwrap()
    }

    #[test]
    fn grid_includes_day_zero() {
        let trajectory = cold(ModelVariant::Extended, 1.2);
        assert_eq!(trajectory.len(), DEFAULT_HORIZON_DAYS + 1);
        let rows: Vec<_> = trajectory.rows().collect();
        assert_eq!(rows.first().unwrap().dias, 1);
        assert_eq!(rows.last().unwrap().dias, 91);
    }

    #[test]
    fn population_is_conserved_every_day() {
        for model in [ModelVariant::Core, ModelVariant::Extended] {
            let trajectory = cold(model, 1.5);
            for state in trajectory.states() {
                assert_relative_eq!(state.total(), 1_000_000.0, CONSERVATION_TOLERANCE);
            }
        }
    }

    #[test]
    fn compartments_stay_non_negative() {
        for model in [ModelVariant::Core, ModelVariant::Extended] {
            let trajectory = cold(model, 1.5);
            for state in trajectory.states() {
                assert!(state.values().iter().all(|v| *v >= -1e-9), "{state:?}");
            }
        }
    }

    #[test]
    fn deaths_never_decrease() {
        for model in [ModelVariant::Core, ModelVariant::Extended] {
            let deaths: Vec<f64> = cold(model, 1.3).series(Compartment::D).collect();
            assert!(deaths.windows(2).all(|w| w[1] >= w[0]), "{model}");
            assert!(deaths.last().unwrap() > deaths.first().unwrap(), "{model}");
        }
    }

    #[test]
    fn core_variant_never_populates_asymptomatic() {
        let trajectory = cold(ModelVariant::Core, 1.3);
        assert!(trajectory.series(Compartment::I0).all(|v| v == 0.0));
    }

    #[test]
    fn identical_inputs_give_identical_trajectories() {
        assert_eq!(
            cold(ModelVariant::Extended, 1.4),
            cold(ModelVariant::Extended, 1.4)
        );
    }

    #[test]
    fn continuation_resumes_from_given_state() {
        let integrator = Integrator {
            horizon_days: 30,
            ..Integrator::new(ModelVariant::Extended, FormulaVariant::RoyalSociety)
        };
        let constants = DiseaseConstants::default();
        let first = integrator
            .integrate(
                &Start::Cold(sample_observation()),
                &sample_profile(),
                &constants,
                1.5,
                "phase_1",
            )
            .unwrap();
        let handover = *first.last().unwrap();
        let second = integrator
            .integrate(
                &Start::Continuation(handover),
                &sample_profile(),
                &constants,
                0.9,
                "phase_2",
            )
            .unwrap();
        assert_eq!(second.initial(), Some(&handover));
        assert_relative_eq!(
            second.last().unwrap().total(),
            handover.total(),
            CONSERVATION_TOLERANCE
        );
    }

    #[test]
    fn continuation_rejects_other_variant() {
        let state = *cold(ModelVariant::Extended, 1.2).last().unwrap();
        let err = Integrator::new(ModelVariant::Core, FormulaVariant::RoyalSociety)
            .prepare(
                &Start::Continuation(state),
                &sample_profile(),
                &DiseaseConstants::default(),
                1.2,
            )
            .unwrap_err();
        assert!(matches!(err, SimulacovidError::InvalidParameter(_)));
    }

    #[test]
    fn non_finite_values_are_a_solver_failure() {
        let integrator = Integrator::default();
        let mut prepared = integrator
            .prepare(
                &Start::Cold(sample_observation()),
                &sample_profile(),
                &DiseaseConstants::default(),
                1.2,
            )
            .unwrap();
        prepared.rates.beta_e = f64::INFINITY;
        let err = integrator.run(&prepared, "broken").unwrap_err();
        assert!(matches!(err, SimulacovidError::SolverFailure { day: 1, .. }));
    }
}
