//! Hospital demand projections from a compartmental epidemic model
//!
//! Simulacovid projects how many people in a place will need a hospital bed or an
//! intensive care bed over the coming days, and when that demand will exceed the beds
//! available. The projection is a deterministic compartmental model (SEAPMDR, or its
//! SEIR-like core) whose initial state and transmission rates are back-solved from a few
//! observed counts and the current effective reproduction number.
//!
//! A projection runs through these stages:
//! * [`exposed`] estimates how many people are already infected but not yet counted.
//! * [`state`] splits the observed population across the compartments.
//! * [`rates`] derives the progression rates and the community and nosocomial
//!   transmission rates that reproduce the given reproduction number.
//! * [`integrator`] integrates [`model`] with a fixed-step Runge-Kutta scheme.
//! * [`scenario`] does this twice, for the most likely and the upper bound of the
//!   reproduction number.
//! * [`capacity`] turns the two trajectories into days until beds run out.
//!
//! [`prepare`] builds the inputs of a projection from a published place record,
//! [`report`] writes the results to CSV files and [`runner`] puts everything behind the
//! `simulacovid` command line tool.
pub mod capacity;
pub mod compartment;
pub mod config;
pub mod error;
pub mod exposed;
pub mod formula;
pub mod integrator;
pub mod log;
pub mod lookup;
pub mod macros;
pub mod model;
pub mod numeric;
pub mod ode;
pub mod parameters;
pub mod prepare;
pub mod rates;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod state;
pub mod trajectory;

pub use capacity::{dday, days_until_exceeded, CapacityDay, Dday, DdaySummary};
pub use compartment::{Compartment, ModelVariant};
pub use config::SimulationConfig;
pub use error::SimulacovidError;
pub use exposed::{estimate_exposed, ExposedEstimate};
pub use formula::{FormulaVariant, GrowthFormula};
pub use integrator::{Integrator, Start};
pub use parameters::{DiseaseConstants, PlaceSeverityProfile, PopulationObservation};
pub use prepare::{estimate_recovered, prepare_simulation, PlaceLevel, PlaceRecord};
pub use rates::{derive_rates, DerivedRates, RateObserver};
pub use scenario::{
    run_scenarios, Bound, BoundPair, NoProjection, Projection, ScenarioResults, ScenarioRunner,
};
pub use state::{build_initial_state, CompartmentState};
pub use trajectory::Trajectory;
