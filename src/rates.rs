//! Progression rates and transmission coefficients of the compartmental model.
//!
//! Progression rates are reciprocals of the stage durations, split into recovery and
//! progression by branching fractions taken from the place's severity profile.
//!
//! The transmission coefficients are back-solved so that the model reproduces the target
//! reproduction number. Every infectious individual infects `Rt / t_avg` people per day on
//! average, where `t_avg` is the severity-weighted infectious duration:
//!
//! ```text
//! βE·E1 + β0·I0 + β1·I1 + β2·I2 + β3·I3 = (E1 + I0 + I1 + I2 + I3) · Rt / t_avg
//! ```
//!
//! The coefficient is shared within the community group (`βE = β0 = β1`, the
//! non-hospitalized compartments) and within the hospital group (`β2 = β3`). Transmission
//! from hospitalized patients is nosocomial, reaching mainly health care workers, so the
//! ratio between the two groups' contributions is fixed by the nosocomial proportion `p`:
//!
//! ```text
//! (βE·E1 + β0·I0 + β1·I1) / (β2·I2 + β3·I3) = (1 - p) / p
//! ```
//!
//! Coefficients are normalized per capita here, so the force of infection is a plain
//! weighted sum of the infectious compartments.

use log::debug;
use serde::Serialize;

use crate::compartment::{Compartment, ModelVariant};
use crate::error::SimulacovidError;
use crate::formula::GrowthFormula;
use crate::parameters::{check_reproduction_number, DiseaseConstants, PlaceSeverityProfile};
use crate::state::CompartmentState;

/// Rates of a single run. All values are per day and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRates {
    /// Latent to pre-symptomatic.
    pub sigma0: f64,
    /// Pre-symptomatic to infected.
    pub sigma1: f64,
    /// Share of new infections that stay asymptomatic.
    pub phi: f64,
    pub gamma0: f64,
    pub gamma1: f64,
    /// Mild to severe.
    pub p1: f64,
    pub gamma2: f64,
    /// Severe to critical.
    pub p2: f64,
    pub gamma3: f64,
    /// Critical to death.
    pub mu: f64,
    pub beta_e: f64,
    pub beta0: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub beta3: f64,
    pub diagnostics: RateDiagnostics,
}

/// Intermediate quantities of the back-solve, kept for inspection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateDiagnostics {
    pub rt: f64,
    pub average_infectious_duration: f64,
    pub doubling_time: f64,
    pub nosocomial_proportion: f64,
    /// Community coefficient before per-capita normalization.
    pub community_beta: f64,
    /// Hospital coefficient before per-capita normalization.
    pub hospital_beta: f64,
    pub population: f64,
}

impl DerivedRates {
    /// Per-capita transmission coefficient of an infectious compartment, zero otherwise.
    #[must_use]
    pub fn beta(&self, compartment: Compartment) -> f64 {
        match compartment {
            Compartment::E1 => self.beta_e,
            Compartment::I0 => self.beta0,
            Compartment::I1 => self.beta1,
            Compartment::I2 => self.beta2,
            Compartment::I3 => self.beta3,
            _ => 0.0,
        }
    }

    /// Every rate by name, in a stable order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, f64); 15] {
        [
            ("sigma0", self.sigma0),
            ("sigma1", self.sigma1),
            ("phi", self.phi),
            ("gamma0", self.gamma0),
            ("gamma1", self.gamma1),
            ("p1", self.p1),
            ("gamma2", self.gamma2),
            ("p2", self.p2),
            ("gamma3", self.gamma3),
            ("mu", self.mu),
            ("beta_e", self.beta_e),
            ("beta0", self.beta0),
            ("beta1", self.beta1),
            ("beta2", self.beta2),
            ("beta3", self.beta3),
        ]
    }
}

/// Receives the rates of every run once they are derived.
pub trait RateObserver: Sync {
    fn rates_derived(&self, label: &str, rates: &DerivedRates);
}

/// Emits one structured `debug` record per derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRateObserver;

impl RateObserver for LogRateObserver {
    fn rates_derived(&self, label: &str, rates: &DerivedRates) {
        let d = &rates.diagnostics;
        debug!(
            "{label}: Rt={} t_avg={:.4} doubling_time={:.4} nosocomial={} beta_community={:.6e} beta_hospital={:.6e}",
            d.rt,
            d.average_infectious_duration,
            d.doubling_time,
            d.nosocomial_proportion,
            d.community_beta,
            d.hospital_beta
        );
    }
}

/// Ignores every derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRateObserver;

impl RateObserver for NullRateObserver {
    fn rates_derived(&self, _label: &str, _rates: &DerivedRates) {}
}

/// `numerator / denominator` as a probability, failing on a zero denominator or a result
/// outside `[0, 1]`.
fn branching_fraction(
    name: &str,
    numerator: f64,
    denominator: f64,
) -> Result<f64, SimulacovidError> {
    if denominator <= 0.0 {
        return Err(SimulacovidError::invalid(format!(
            "{name} is undefined: denominator is zero"
        )));
    }
    let fraction = numerator / denominator;
    if !(0.0..=1.0).contains(&fraction) {
        return Err(SimulacovidError::invalid(format!(
            "{name} must lie in [0, 1], got {fraction}"
        )));
    }
    Ok(fraction)
}

/// Derives the rates for one run from the constants, the place profile, the target `rt`
/// and the state the run starts from.
///
/// # Errors
/// `InvalidParameter` for a non-positive `rt`, invalid inputs, a branching fraction with a
/// zero denominator, or a state without community or hospitalized infections (the
/// transmission split is then undefined).
pub fn derive_rates(
    profile: &PlaceSeverityProfile,
    constants: &DiseaseConstants,
    rt: f64,
    state: &CompartmentState,
    formula: &dyn GrowthFormula,
) -> Result<DerivedRates, SimulacovidError> {
    let rt = check_reproduction_number(rt)?;
    profile.validate()?;
    constants.validate()?;
    let variant = state.variant();

    // In the core variant asymptomatic cases follow the mild course.
    let mild = match variant {
        ModelVariant::Extended => profile.mild,
        ModelVariant::Core => profile.asymptomatic + profile.mild,
    };
    let frac_mild_to_severe =
        branching_fraction("mild to severe fraction", profile.severe, mild + profile.severe)?;
    let frac_severe_to_critical = branching_fraction(
        "severe to critical fraction",
        profile.critical,
        profile.severe + profile.critical,
    )?;
    let frac_critical_to_death =
        branching_fraction("critical to death fraction", profile.fatality_ratio, profile.critical)?;

    let t_avg = constants.average_infectious_duration(profile);
    let doubling_time = formula.doubling_time(rt, t_avg);
    let nosocomial = formula.nosocomial_proportion(profile, constants);

    let community = state.community_infectious();
    let hospital = state.hospitalized();
    if community <= 0.0 || hospital <= 0.0 {
        return Err(SimulacovidError::invalid(format!(
            "transmission split needs community and hospitalized infections, got {community} and {hospital}"
        )));
    }
    let daily_infections = (community + hospital) * rt / t_avg;
    let hospital_beta = nosocomial * daily_infections / hospital;
    let community_beta = (1.0 - nosocomial) * daily_infections / community;

    let population = state.total();
    if population <= 0.0 {
        return Err(SimulacovidError::invalid("population must be positive"));
    }

    let rates = DerivedRates {
        sigma0: 1.0 / constants.latent_period(),
        sigma1: 1.0 / constants.presymptomatic_period,
        phi: match variant {
            ModelVariant::Extended => constants.asymptomatic_proportion,
            ModelVariant::Core => 0.0,
        },
        gamma0: 1.0 / constants.asymptomatic_duration,
        gamma1: (1.0 - frac_mild_to_severe) / constants.mild_duration,
        p1: frac_mild_to_severe / constants.mild_duration,
        gamma2: (1.0 - frac_severe_to_critical) / constants.severe_duration,
        p2: frac_severe_to_critical / constants.severe_duration,
        gamma3: (1.0 - frac_critical_to_death) / constants.critical_duration,
        mu: frac_critical_to_death / constants.critical_duration,
        beta_e: community_beta / population,
        beta0: community_beta / population,
        beta1: community_beta / population,
        beta2: hospital_beta / population,
        beta3: hospital_beta / population,
        diagnostics: RateDiagnostics {
            rt,
            average_infectious_duration: t_avg,
            doubling_time,
            nosocomial_proportion: nosocomial,
            community_beta,
            hospital_beta,
            population,
        },
    };

    if let Some((name, value)) = rates
        .named()
        .into_iter()
        .find(|(_, value)| !(value.is_finite() && *value >= 0.0))
    {
        return Err(SimulacovidError::invalid(format!(
            "derived rate {name} is not a non-negative number ({value})"
        )));
    }
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::N_COMPARTMENTS;
    use crate::formula::{Hill2020FixedSplit, RoyalSociety};
    use crate::model::derivatives;
    use crate::parameters::tests::{sample_observation, sample_profile};
    use crate::state::build_initial_state;
    use crate::state::tests::sample_exposed;
    use crate::{assert_almost_eq, assert_relative_eq};
    use strum::IntoEnumIterator;

    fn sample_state(variant: ModelVariant) -> CompartmentState {
        build_initial_state(
            &sample_observation(),
            &sample_profile(),
            &sample_exposed(),
            variant,
        )
        .unwrap()
    }

    fn rates_for(variant: ModelVariant, rt: f64) -> DerivedRates {
        derive_rates(
            &sample_profile(),
            &DiseaseConstants::default(),
            rt,
            &sample_state(variant),
            &RoyalSociety,
        )
        .unwrap()
    }

    #[test]
    fn progression_rates_are_reciprocal_durations() {
        let rates = rates_for(ModelVariant::Extended, 1.2);
        assert_almost_eq!(rates.sigma0, 1.0 / 3.0, 1e-12);
        assert_almost_eq!(rates.sigma1, 0.5, 1e-12);
        assert_almost_eq!(rates.gamma1 + rates.p1, 1.0 / 6.0, 1e-12);
        assert_almost_eq!(rates.gamma2 + rates.p2, 1.0 / 6.0, 1e-12);
        assert_almost_eq!(rates.gamma3 + rates.mu, 1.0 / 8.0, 1e-12);
        // 0.02 / 0.05 of critical cases die
        assert_almost_eq!(rates.mu, 0.4 / 8.0, 1e-12);
        assert_eq!(rates.phi, 0.4);
    }

    #[test]
    fn core_variant_has_no_asymptomatic_branch() {
        let rates = rates_for(ModelVariant::Core, 1.2);
        assert_eq!(rates.phi, 0.0);
        // severe / (asymptomatic + mild + severe)
        assert_almost_eq!(rates.p1 * 6.0, 0.2 / 0.95, 1e-12);
    }

    #[test]
    fn betas_reproduce_target_rt_and_split() {
        for variant in [ModelVariant::Core, ModelVariant::Extended] {
            let state = sample_state(variant);
            let rates = rates_for(variant, 1.3);
            let d = rates.diagnostics;

            let pressure: f64 = Compartment::iter()
                .map(|c| rates.beta(c) * state[c])
                .sum::<f64>()
                * state.total();
            let infectious = state.community_infectious() + state.hospitalized();
            assert_relative_eq!(pressure, infectious * 1.3 / d.average_infectious_duration, 1e-12);

            let community = rates.beta_e * state.community_infectious();
            let hospital = rates.beta2 * state.hospitalized();
            assert_relative_eq!(community / hospital, 0.95 / 0.05, 1e-12);
        }
    }

    #[test]
    fn one_euler_step_grows_at_target_rate() {
        let state = sample_state(ModelVariant::Extended);
        let rates = rates_for(ModelVariant::Extended, 1.5);
        let mut dy = [0.0; N_COMPARTMENTS];
        derivatives(&rates, state.values(), &mut dy);

        let dt = 1.0;
        let s0 = state[Compartment::S];
        let s1 = s0 + dt * dy[Compartment::S.index()];
        let infectious = state.community_infectious() + state.hospitalized();
        let per_capita_rate = (s0 - s1) / dt / (infectious * s0 / state.total());
        assert_relative_eq!(
            per_capita_rate,
            1.5 / rates.diagnostics.average_infectious_duration,
            1e-9
        );
    }

    #[test]
    fn fixed_split_ignores_place_nosocomial_proportion() {
        let profile = PlaceSeverityProfile {
            nosocomial_proportion: Some(0.3),
            ..sample_profile()
        };
        let state = sample_state(ModelVariant::Extended);
        let constants = DiseaseConstants::default();
        let place = derive_rates(&profile, &constants, 1.2, &state, &RoyalSociety).unwrap();
        let fixed = derive_rates(&profile, &constants, 1.2, &state, &Hill2020FixedSplit).unwrap();
        assert_eq!(place.diagnostics.nosocomial_proportion, 0.3);
        assert_eq!(fixed.diagnostics.nosocomial_proportion, 0.05);
        assert!(place.beta2 > fixed.beta2);
    }

    #[test]
    fn zero_nosocomial_proportion_is_clamped() {
        let profile = PlaceSeverityProfile {
            nosocomial_proportion: Some(0.0),
            ..sample_profile()
        };
        let state = sample_state(ModelVariant::Extended);
        let rates = derive_rates(
            &profile,
            &DiseaseConstants::default(),
            1.2,
            &state,
            &RoyalSociety,
        )
        .unwrap();
        assert_eq!(
            rates.diagnostics.nosocomial_proportion,
            crate::formula::MIN_NOSOCOMIAL_PROPORTION
        );
        assert!(rates.beta2 > 0.0 && rates.beta2.is_finite());
        assert!(rates.beta_e.is_finite());
    }

    #[test]
    fn zero_critical_fraction_is_rejected() {
        let profile = PlaceSeverityProfile {
            asymptomatic: 0.45,
            critical: 0.0,
            ..sample_profile()
        };
        let err = derive_rates(
            &profile,
            &DiseaseConstants::default(),
            1.2,
            &sample_state(ModelVariant::Extended),
            &RoyalSociety,
        )
        .unwrap_err();
        assert!(matches!(err, SimulacovidError::InvalidParameter(_)));
    }

    #[test]
    fn fatality_above_critical_share_is_rejected() {
        let profile = PlaceSeverityProfile {
            fatality_ratio: 0.1,
            ..sample_profile()
        };
        assert!(derive_rates(
            &profile,
            &DiseaseConstants::default(),
            1.2,
            &sample_state(ModelVariant::Extended),
            &RoyalSociety,
        )
        .is_err());
    }

    #[test]
    fn state_without_hospitalized_cases_is_rejected() {
        let mut values = *sample_state(ModelVariant::Extended).values();
        values[Compartment::S.index()] += values[Compartment::I2.index()];
        values[Compartment::S.index()] += values[Compartment::I3.index()];
        values[Compartment::I2.index()] = 0.0;
        values[Compartment::I3.index()] = 0.0;
        let state = CompartmentState::new(ModelVariant::Extended, values).unwrap();
        let err = derive_rates(
            &sample_profile(),
            &DiseaseConstants::default(),
            1.2,
            &state,
            &RoyalSociety,
        )
        .unwrap_err();
        assert!(matches!(err, SimulacovidError::InvalidParameter(_)));
    }

    #[test]
    fn all_rates_are_named_and_non_negative() {
        let rates = rates_for(ModelVariant::Extended, 2.5);
        assert!(rates.named().iter().all(|(_, v)| *v >= 0.0));
        assert_eq!(rates.beta(Compartment::S), 0.0);
    }
}
