//! Estimation of the exposed population, which is never observed directly.
//!
//! The currently infectious, non-hospitalized cases (asymptomatic and mild) grow by the
//! one-day factor implied by the doubling time. The people who will become those cases over
//! the next incubation period are exposed today, so the exposed total is that one-day
//! growth times the incubation period. It is split between the latent and pre-symptomatic
//! phases in proportion to their lengths.

use serde::Serialize;

use crate::error::SimulacovidError;
use crate::formula::GrowthFormula;
use crate::parameters::{check_reproduction_number, DiseaseConstants, PlaceSeverityProfile};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposedEstimate {
    pub total: f64,
    pub latent: f64,
    pub presymptomatic: f64,
    /// Doubling time the estimate was derived from, in days.
    pub doubling_time: f64,
}

/// Estimates the exposed compartments from the active infections.
///
/// # Errors
/// `InvalidParameter` if `rt` is not positive, `active_infected` is negative or
/// non-finite, or the doubling time is not a positive finite number.
pub fn estimate_exposed(
    active_infected: f64,
    profile: &PlaceSeverityProfile,
    constants: &DiseaseConstants,
    rt: f64,
    formula: &dyn GrowthFormula,
) -> Result<ExposedEstimate, SimulacovidError> {
    let rt = check_reproduction_number(rt)?;
    if !(active_infected.is_finite() && active_infected >= 0.0) {
        return Err(SimulacovidError::invalid(format!(
            "active_infected must be a non-negative number, got {active_infected}"
        )));
    }

    let t_avg = constants.average_infectious_duration(profile);
    let doubling_time = formula.doubling_time(rt, t_avg);
    if !(doubling_time.is_finite() && doubling_time > 0.0) {
        return Err(SimulacovidError::invalid(format!(
            "doubling time is undefined for Rt = {rt} and average infectious duration {t_avg}"
        )));
    }
    let growth = formula.daily_growth_factor(doubling_time);

    let community_cases = active_infected * (profile.asymptomatic + profile.mild);
    let total = growth * community_cases * constants.incubation_period;
    let latent = total * constants.latent_period() / constants.incubation_period;

    Ok(ExposedEstimate {
        total,
        latent,
        presymptomatic: total - latent,
        doubling_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::formula::{Hill2020FixedSplit, RoyalSociety, SimplifiedDoublingTime};
    use crate::parameters::tests::sample_profile;

    #[test]
    fn phases_add_up_to_total() {
        let constants = DiseaseConstants::default();
        let exposed =
            estimate_exposed(1_000.0, &sample_profile(), &constants, 1.5, &RoyalSociety).unwrap();
        assert!(exposed.total > 0.0);
        assert_almost_eq!(exposed.latent + exposed.presymptomatic, exposed.total, 1e-9);
        // latent period 3 of 5 incubation days
        assert_almost_eq!(exposed.latent / exposed.total, 0.6, 1e-12);
    }

    #[test]
    fn presymptomatic_matches_one_day_of_growth() {
        let constants = DiseaseConstants::default();
        let profile = sample_profile();
        let exposed = estimate_exposed(1_000.0, &profile, &constants, 1.2, &RoyalSociety).unwrap();
        let td = std::f64::consts::LN_2 * 9.9 / 1.2;
        let growth = 2f64.powf(1.0 / td) - 1.0;
        let expected = growth * 750.0 * constants.presymptomatic_period;
        assert_almost_eq!(exposed.presymptomatic, expected, 1e-9);
        assert_almost_eq!(exposed.doubling_time, td, 1e-12);
    }

    #[test]
    fn higher_rt_means_more_exposed() {
        let constants = DiseaseConstants::default();
        let profile = sample_profile();
        let low = estimate_exposed(1_000.0, &profile, &constants, 1.1, &RoyalSociety).unwrap();
        let high = estimate_exposed(1_000.0, &profile, &constants, 1.5, &RoyalSociety).unwrap();
        assert!(high.total > low.total);
    }

    #[test]
    fn formulas_disagree_but_stay_consistent() {
        let constants = DiseaseConstants::default();
        let profile = sample_profile();
        let simplified =
            estimate_exposed(1_000.0, &profile, &constants, 1.1, &SimplifiedDoublingTime).unwrap();
        let hill =
            estimate_exposed(1_000.0, &profile, &constants, 1.1, &Hill2020FixedSplit).unwrap();
        let royal = estimate_exposed(1_000.0, &profile, &constants, 1.1, &RoyalSociety).unwrap();
        assert!(simplified.total > royal.total);
        assert!(hill.total < royal.total);
        for estimate in [simplified, hill, royal] {
            assert_almost_eq!(
                estimate.latent + estimate.presymptomatic,
                estimate.total,
                1e-9
            );
        }
    }

    #[test]
    fn no_active_cases_means_no_exposed() {
        let exposed = estimate_exposed(
            0.0,
            &sample_profile(),
            &DiseaseConstants::default(),
            1.3,
            &RoyalSociety,
        )
        .unwrap();
        assert_eq!(exposed.total, 0.0);
    }

    #[test]
    fn non_positive_rt_is_rejected() {
        for rt in [0.0, -0.5, f64::NAN] {
            let err = estimate_exposed(
                1_000.0,
                &sample_profile(),
                &DiseaseConstants::default(),
                rt,
                &RoyalSociety,
            )
            .unwrap_err();
            assert!(matches!(err, SimulacovidError::InvalidParameter(_)));
        }
    }
}
