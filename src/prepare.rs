//! Turns a published place record into the inputs of a projection.
//!
//! A place with no notification rate, or a notification rate of zero, has no projection.
//! A health region without its own reproduction number borrows the latest estimate of its
//! state; a state without one has no projection.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::compartment::Compartment;
use crate::config::SimulationConfig;
use crate::error::SimulacovidError;
use crate::lookup::{PlaceParameterLookup, RtLookup};
use crate::parameters::{PlaceSeverityProfile, PopulationObservation};
use crate::scenario::{check_data_quality, BoundPair, NoProjection, Projection};

/// Administrative level a projection is computed for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaceLevel {
    #[default]
    HealthRegion,
    State,
}

/// The latest published indicators of a place. Missing values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub state_num_id: String,
    #[serde(default)]
    pub health_region_id: Option<String>,
    pub population: u64,
    pub active_cases: f64,
    #[serde(default)]
    pub deaths: Option<f64>,
    pub confirmed_cases: f64,
    #[serde(default)]
    pub notification_rate: Option<f64>,
    #[serde(default)]
    pub rt_most_likely: Option<f64>,
    #[serde(default)]
    pub rt_high_95: Option<f64>,
    #[serde(default)]
    pub number_beds: Option<f64>,
    #[serde(default)]
    pub number_icu_beds: Option<f64>,
}

impl PlaceRecord {
    /// Id of the place at `level`.
    ///
    /// # Errors
    /// `InvalidParameter` if the record has no health region id.
    pub fn place_id(&self, level: PlaceLevel) -> Result<&str, SimulacovidError> {
        match level {
            PlaceLevel::State => Ok(&self.state_num_id),
            PlaceLevel::HealthRegion => self.health_region_id.as_deref().ok_or_else(|| {
                SimulacovidError::invalid(format!(
                    "record of state {} has no health_region_id",
                    self.state_num_id
                ))
            }),
        }
    }
}

/// Everything a two-bound projection and its capacity indicator need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub observation: PopulationObservation,
    pub profile: PlaceSeverityProfile,
    pub rt: BoundPair<f64>,
    /// Beds available for new patients, already scaled by the available proportion.
    pub n_beds: Option<f64>,
    pub n_icu_beds: Option<f64>,
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Recovered population implied by the reported confirmed cases corrected for
/// under-notification.
///
/// # Errors
/// `InvalidParameter` for a notification rate outside `(0, 1]`, `NegativeState` when
/// the corrected case count is smaller than the active cases plus deaths.
pub fn estimate_recovered(
    confirmed_cases: f64,
    notification_rate: f64,
    active_infected: f64,
    deaths: f64,
) -> Result<f64, SimulacovidError> {
    if !(notification_rate > 0.0 && notification_rate <= 1.0) {
        return Err(SimulacovidError::invalid(format!(
            "notification_rate must lie in (0, 1], got {notification_rate}"
        )));
    }
    let confirmed_adjusted = (confirmed_cases / notification_rate).trunc();
    if confirmed_adjusted == 0.0 {
        return Ok(0.0);
    }
    let recovered = confirmed_adjusted - active_infected - deaths;
    if recovered < 0.0 {
        return Err(SimulacovidError::NegativeState {
            compartment: Compartment::R,
            value: recovered,
        });
    }
    Ok(recovered)
}

/// Reproduction number bounds of the place, falling back to the state estimate for a
/// health region without its own.
fn resolve_rt(
    record: &PlaceRecord,
    level: PlaceLevel,
    rt_lookup: &dyn RtLookup,
) -> BoundPair<Option<f64>> {
    let own = BoundPair::new(present(record.rt_most_likely), present(record.rt_high_95));
    if own.best.is_some() || level != PlaceLevel::HealthRegion {
        return own;
    }
    match rt_lookup.state_rt(&record.state_num_id) {
        Some(estimate) => {
            info!(
                "using Rt of state {} updated {}",
                record.state_num_id, estimate.last_updated
            );
            BoundPair::new(Some(estimate.most_likely), Some(estimate.high_95))
        }
        None => own,
    }
}

/// Builds the projection inputs of one place.
///
/// # Errors
/// Unknown place parameters, an invalid profile or observation, a negative or infinite
/// death count, or a negative recovered estimate.
pub fn prepare_simulation(
    record: &PlaceRecord,
    level: PlaceLevel,
    config: &SimulationConfig,
    places: &dyn PlaceParameterLookup,
    rt_lookup: &dyn RtLookup,
) -> Result<Projection<SimulationParams>, SimulacovidError> {
    let notification_rate = present(record.notification_rate);
    let rt = resolve_rt(record, level, rt_lookup);
    if let Some(reason) = check_data_quality(notification_rate, &rt) {
        return Ok(Projection::Unavailable(reason));
    }
    let (Some(notification_rate), Some(best), Some(worst)) = (notification_rate, rt.best, rt.worst)
    else {
        return Ok(Projection::Unavailable(NoProjection::MissingReproductionNumber));
    };

    let place_id = record.place_id(level)?;
    let profile = places.severity_profile(place_id, &record.state_num_id)?;

    let active_infected = record.active_cases.trunc();
    let deaths = present(record.deaths).unwrap_or(0.0).trunc();
    if !deaths.is_finite() {
        return Err(SimulacovidError::invalid(format!(
            "deaths must be finite, got {deaths}"
        )));
    }
    if deaths < 0.0 {
        return Err(SimulacovidError::NegativeState {
            compartment: Compartment::D,
            value: deaths,
        });
    }
    let recovered = estimate_recovered(
        record.confirmed_cases,
        notification_rate,
        active_infected,
        deaths,
    )?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let observation = PopulationObservation {
        total_population: record.population,
        active_infected,
        deaths: deaths as u64,
        recovered,
    };
    observation.validate()?;
    debug!("{place_id}: {observation:?}, Rt {best} / {worst}");

    Ok(Projection::Available(SimulationParams {
        observation,
        profile,
        rt: BoundPair::new(best, worst),
        n_beds: config.available(record.number_beds),
        n_icu_beds: config.available(record.number_icu_beds),
    }))
}
