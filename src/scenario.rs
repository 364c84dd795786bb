//! Best- and worst-case projections for one place.
//!
//! The runner first applies the data-quality gate: a place without a usable notification
//! rate or reproduction number gets no projection at all, reported as a
//! [`Projection::Unavailable`] carrying the reason. It then prepares both bounds; an
//! estimation or derivation error for either aborts the whole run. Finally it integrates
//! each bound independently. A solver failure is kept for its bound only, so the other
//! bound's trajectory is still returned.

use std::thread;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::compartment::ModelVariant;
use crate::config::SimulationConfig;
use crate::error::SimulacovidError;
use crate::formula::FormulaVariant;
use crate::integrator::{Integrator, PreparedRun, Start};
use crate::parameters::{DiseaseConstants, PlaceSeverityProfile, PopulationObservation};
use crate::rates::{LogRateObserver, RateObserver};
use crate::trajectory::Trajectory;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Bound {
    /// Upper 95% bound of the reproduction number.
    Worst,
    /// Most likely reproduction number.
    Best,
}

/// One value per bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundPair<T> {
    pub worst: T,
    pub best: T,
}

impl<T> BoundPair<T> {
    pub fn new(best: T, worst: T) -> Self {
        BoundPair { worst, best }
    }

    pub fn get(&self, bound: Bound) -> &T {
        match bound {
            Bound::Worst => &self.worst,
            Bound::Best => &self.best,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Bound, T) -> U) -> BoundPair<U> {
        BoundPair {
            worst: f(Bound::Worst, self.worst),
            best: f(Bound::Best, self.best),
        }
    }

    pub fn as_ref(&self) -> BoundPair<&T> {
        BoundPair {
            worst: &self.worst,
            best: &self.best,
        }
    }

    /// Worst first, as the bounds are always processed.
    pub fn iter(&self) -> impl Iterator<Item = (Bound, &T)> {
        [(Bound::Worst, &self.worst), (Bound::Best, &self.best)].into_iter()
    }
}

/// Why a place gets no projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoProjection {
    MissingNotificationRate,
    ZeroNotificationRate,
    MissingReproductionNumber,
}

/// Either a value or the reason there is none. Callers must match on it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection<T> {
    Available(T),
    Unavailable(NoProjection),
}

impl<T> Projection<T> {
    pub fn available(self) -> Option<T> {
        match self {
            Projection::Available(value) => Some(value),
            Projection::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<NoProjection> {
        match self {
            Projection::Available(_) => None,
            Projection::Unavailable(reason) => Some(*reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Projection<U> {
        match self {
            Projection::Available(value) => Projection::Available(f(value)),
            Projection::Unavailable(reason) => Projection::Unavailable(reason),
        }
    }
}

/// Checks that a place has the data a projection needs. `None` means it does.
#[must_use]
pub fn check_data_quality(
    notification_rate: Option<f64>,
    rt: &BoundPair<Option<f64>>,
) -> Option<NoProjection> {
    match notification_rate {
        None => return Some(NoProjection::MissingNotificationRate),
        Some(rate) if rate.is_nan() => return Some(NoProjection::MissingNotificationRate),
        Some(rate) if rate == 0.0 => return Some(NoProjection::ZeroNotificationRate),
        Some(_) => {}
    }
    let missing = |value: Option<f64>| value.is_none_or(f64::is_nan);
    if missing(rt.best) || missing(rt.worst) {
        return Some(NoProjection::MissingReproductionNumber);
    }
    None
}

/// Inputs of a two-bound projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioRequest {
    pub observation: PopulationObservation,
    pub profile: PlaceSeverityProfile,
    pub notification_rate: Option<f64>,
    pub rt: BoundPair<Option<f64>>,
}

/// Trajectories of both bounds. A bound whose integration failed holds its error.
#[derive(Debug)]
pub struct ScenarioResults {
    pub model: ModelVariant,
    pub worst: Result<Trajectory, SimulacovidError>,
    pub best: Result<Trajectory, SimulacovidError>,
}

impl ScenarioResults {
    #[must_use]
    pub fn get(&self, bound: Bound) -> Result<&Trajectory, &SimulacovidError> {
        match bound {
            Bound::Worst => self.worst.as_ref(),
            Bound::Best => self.best.as_ref(),
        }
    }

    /// Successful trajectories, worst first.
    pub fn trajectories(&self) -> impl Iterator<Item = &Trajectory> {
        [self.worst.as_ref(), self.best.as_ref()]
            .into_iter()
            .filter_map(Result::ok)
    }
}

pub struct ScenarioRunner<'a> {
    constants: DiseaseConstants,
    integrator: Integrator,
    scenario: String,
    parallel: bool,
    observer: &'a dyn RateObserver,
}

impl ScenarioRunner<'static> {
    /// A runner that logs the derived rates.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        ScenarioRunner {
            constants: config.disease,
            integrator: config.integrator(),
            scenario: config.scenario.clone(),
            parallel: false,
            observer: &LogRateObserver,
        }
    }
}

impl<'a> ScenarioRunner<'a> {
    /// Integrates the two bounds on separate threads.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn with_observer<'b>(self, observer: &'b dyn RateObserver) -> ScenarioRunner<'b> {
        ScenarioRunner {
            constants: self.constants,
            integrator: self.integrator,
            scenario: self.scenario,
            parallel: self.parallel,
            observer,
        }
    }

    #[must_use]
    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    /// Gates, prepares and integrates both bounds.
    ///
    /// # Errors
    /// `InvalidParameter` for a notification rate outside `(0, 1]`; estimation and
    /// derivation errors of either bound.
    pub fn run(
        &self,
        request: &ScenarioRequest,
    ) -> Result<Projection<ScenarioResults>, SimulacovidError> {
        if let Some(reason) = check_data_quality(request.notification_rate, &request.rt) {
            info!("no projection: {reason}");
            return Ok(Projection::Unavailable(reason));
        }
        if let Some(rate) = request
            .notification_rate
            .filter(|rate| !(*rate > 0.0 && *rate <= 1.0))
        {
            return Err(SimulacovidError::invalid(format!(
                "notification_rate must lie in (0, 1], got {rate}"
            )));
        }
        let rt = request.rt.map(|_, value| value.unwrap_or(f64::NAN));
        self.run_bounds(&request.observation, &request.profile, rt)
            .map(Projection::Available)
    }

    /// Prepares and integrates both bounds from already resolved reproduction numbers.
    ///
    /// # Errors
    /// Estimation and derivation errors of either bound.
    pub fn run_bounds(
        &self,
        observation: &PopulationObservation,
        profile: &PlaceSeverityProfile,
        rt: BoundPair<f64>,
    ) -> Result<ScenarioResults, SimulacovidError> {
        let start = Start::Cold(*observation);
        let prepared = BoundPair {
            worst: self.prepare(Bound::Worst, &start, profile, rt.worst)?,
            best: self.prepare(Bound::Best, &start, profile, rt.best)?,
        };

        let (worst, best) = if self.parallel {
            thread::scope(|scope| {
                let worst = scope.spawn(|| self.integrate(Bound::Worst, &prepared.worst));
                let best = self.integrate(Bound::Best, &prepared.best);
                let worst = worst
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                (worst, best)
            })
        } else {
            (
                self.integrate(Bound::Worst, &prepared.worst),
                self.integrate(Bound::Best, &prepared.best),
            )
        };

        Ok(ScenarioResults {
            model: self.integrator.model,
            worst,
            best,
        })
    }

    fn prepare(
        &self,
        bound: Bound,
        start: &Start,
        profile: &PlaceSeverityProfile,
        rt: f64,
    ) -> Result<PreparedRun, SimulacovidError> {
        let prepared = self
            .integrator
            .prepare(start, profile, &self.constants, rt)?;
        self.observer
            .rates_derived(&format!("{} {bound}", self.scenario), &prepared.rates);
        Ok(prepared)
    }

    fn integrate(
        &self,
        bound: Bound,
        prepared: &PreparedRun,
    ) -> Result<Trajectory, SimulacovidError> {
        let result = self
            .integrator
            .run(prepared, &self.scenario)
            .map(|trajectory| trajectory.with_bound(bound));
        if let Err(error) = &result {
            warn!("{bound} bound failed: {error}");
        }
        result
    }
}

/// Runs the best and worst bounds for one place with the default configuration apart from
/// the model variant. A place failing the data-quality gate gets no projection and no
/// numeric work is done for it.
///
/// # Errors
/// See [`ScenarioRunner::run`].
pub fn run_scenarios(
    observation: &PopulationObservation,
    profile: &PlaceSeverityProfile,
    constants: &DiseaseConstants,
    notification_rate: Option<f64>,
    rt_best: Option<f64>,
    rt_worst: Option<f64>,
    model: ModelVariant,
) -> Result<Projection<ScenarioResults>, SimulacovidError> {
    let config = SimulationConfig {
        disease: *constants,
        model,
        formula: FormulaVariant::default(),
        ..SimulationConfig::default()
    };
    ScenarioRunner::new(&config).run(&ScenarioRequest {
        observation: *observation,
        profile: *profile,
        notification_rate,
        rt: BoundPair::new(rt_best, rt_worst),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::Compartment;
    use crate::parameters::tests::{sample_observation, sample_profile};
    use crate::rates::DerivedRates;
    use std::sync::Mutex;

    fn request(notification_rate: Option<f64>, rt: BoundPair<Option<f64>>) -> ScenarioRequest {
        ScenarioRequest {
            observation: sample_observation(),
            profile: sample_profile(),
            notification_rate,
            rt,
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl RateObserver for Recorder {
        fn rates_derived(&self, label: &str, _rates: &DerivedRates) {
            self.0.lock().unwrap().push(label.to_string());
        }
    }

    #[test]
    fn gate_reports_missing_notification_rate() {
        let rt = BoundPair::new(Some(1.1), Some(1.5));
        assert_eq!(
            check_data_quality(None, &rt),
            Some(NoProjection::MissingNotificationRate)
        );
        assert_eq!(
            check_data_quality(Some(f64::NAN), &rt),
            Some(NoProjection::MissingNotificationRate)
        );
        assert_eq!(
            check_data_quality(Some(0.0), &rt),
            Some(NoProjection::ZeroNotificationRate)
        );
        assert_eq!(check_data_quality(Some(0.1), &rt), None);
    }

    #[test]
    fn gate_reports_missing_rt() {
        let rt = BoundPair::new(None, Some(1.5));
        assert_eq!(
            check_data_quality(Some(0.1), &rt),
            Some(NoProjection::MissingReproductionNumber)
        );
    }

    #[test]
    fn gated_request_never_derives_rates() {
        let recorder = Recorder::default();
        let config = SimulationConfig::default();
        let runner = ScenarioRunner::new(&config).with_observer(&recorder);
        let outcome = runner
            .run(&request(Some(0.0), BoundPair::new(Some(1.1), Some(1.5))))
            .unwrap();
        assert_eq!(outcome.reason(), Some(NoProjection::ZeroNotificationRate));
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn both_bounds_are_tagged_and_observed() {
        let recorder = Recorder::default();
        let config = SimulationConfig::default();
        let runner = ScenarioRunner::new(&config).with_observer(&recorder);
        let results = runner
            .run(&request(Some(0.1), BoundPair::new(Some(1.1), Some(1.5))))
            .unwrap()
            .available()
            .unwrap();
        assert_eq!(results.get(Bound::Worst).unwrap().bound, Some(Bound::Worst));
        assert_eq!(results.get(Bound::Best).unwrap().bound, Some(Bound::Best));
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                "projection_current_rt worst".to_string(),
                "projection_current_rt best".to_string()
            ]
        );
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let config = SimulationConfig::default();
        let observation = sample_observation();
        let profile = sample_profile();
        let rt = BoundPair::new(1.1, 1.5);
        let sequential = ScenarioRunner::new(&config)
            .run_bounds(&observation, &profile, rt)
            .unwrap();
        let parallel = ScenarioRunner::new(&config)
            .parallel(true)
            .run_bounds(&observation, &profile, rt)
            .unwrap();
        assert_eq!(sequential.worst.unwrap(), parallel.worst.unwrap());
        assert_eq!(sequential.best.unwrap(), parallel.best.unwrap());
    }

    fn scenarios(
        notification_rate: Option<f64>,
        rt_best: Option<f64>,
        rt_worst: Option<f64>,
        model: ModelVariant,
    ) -> Result<Projection<ScenarioResults>, SimulacovidError> {
        run_scenarios(
            &sample_observation(),
            &sample_profile(),
            &DiseaseConstants::default(),
            notification_rate,
            rt_best,
            rt_worst,
            model,
        )
    }

    #[test]
    fn run_scenarios_applies_the_gate() {
        let cases = [
            (None, Some(1.1), NoProjection::MissingNotificationRate),
            (Some(0.0), Some(1.1), NoProjection::ZeroNotificationRate),
            (Some(0.1), None, NoProjection::MissingReproductionNumber),
        ];
        for (notification_rate, rt_best, reason) in cases {
            let outcome = scenarios(notification_rate, rt_best, Some(1.5), ModelVariant::Extended)
                .unwrap();
            assert_eq!(outcome.reason(), Some(reason));
        }
    }

    #[test]
    fn out_of_range_notification_rate_is_an_error() {
        let recorder = Recorder::default();
        let config = SimulationConfig::default();
        let runner = ScenarioRunner::new(&config).with_observer(&recorder);
        for rate in [-0.2, 1.5] {
            let err = runner
                .run(&request(Some(rate), BoundPair::new(Some(1.1), Some(1.5))))
                .unwrap_err();
            assert!(matches!(err, SimulacovidError::InvalidParameter(_)));
        }
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_bound_blocks_the_whole_run() {
        let err = scenarios(Some(0.1), Some(1.1), Some(-1.0), ModelVariant::Extended).unwrap_err();
        assert!(matches!(err, SimulacovidError::InvalidParameter(_)));
    }

    #[test]
    fn worst_bound_projects_more_deaths() {
        for model in [ModelVariant::Core, ModelVariant::Extended] {
            let results = scenarios(Some(0.1), Some(1.1), Some(1.5), model)
                .unwrap()
                .available()
                .unwrap();
            let deaths = |t: &Trajectory| t.last().unwrap()[Compartment::D];
            assert!(deaths(results.worst.as_ref().unwrap()) > deaths(results.best.as_ref().unwrap()));
            assert_eq!(results.trajectories().count(), 2);
        }
    }
}
