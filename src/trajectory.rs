use serde::Serialize;

use crate::compartment::{Compartment, ModelVariant};
use crate::scenario::Bound;
use crate::state::CompartmentState;

/// Compartment sizes for each integer day of a projection, starting at day 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub scenario: String,
    pub bound: Option<Bound>,
    pub model: ModelVariant,
    days: Vec<CompartmentState>,
}

/// One output row. `dias` is 1-based: the initial state is row 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryRow<'a> {
    pub dias: usize,
    pub compartments: Vec<(Compartment, f64)>,
    /// Row sum of the compartments.
    pub n: f64,
    /// `E0 + E1`.
    pub e: f64,
    pub scenario: &'a str,
    pub model: ModelVariant,
    pub bound: Option<Bound>,
}

impl Trajectory {
    pub(crate) fn new(scenario: String, model: ModelVariant, days: Vec<CompartmentState>) -> Self {
        Trajectory {
            scenario,
            bound: None,
            model,
            days,
        }
    }

    #[must_use]
    pub fn with_bound(mut self, bound: Bound) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Number of stored days, including day 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// State on `day`, counting the initial state as day 0.
    #[must_use]
    pub fn day(&self, day: usize) -> Option<&CompartmentState> {
        self.days.get(day)
    }

    #[must_use]
    pub fn initial(&self) -> Option<&CompartmentState> {
        self.days.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&CompartmentState> {
        self.days.last()
    }

    pub fn states(&self) -> impl Iterator<Item = &CompartmentState> {
        self.days.iter()
    }

    /// The series of one compartment, day 0 first.
    pub fn series(&self, compartment: Compartment) -> impl Iterator<Item = f64> + '_ {
        self.days.iter().map(move |state| state.get(compartment))
    }

    pub fn rows(&self) -> impl Iterator<Item = TrajectoryRow<'_>> {
        self.days
            .iter()
            .enumerate()
            .map(move |(index, state)| TrajectoryRow {
                dias: index + 1,
                compartments: state.iter().collect(),
                n: state.total(),
                e: state.exposed(),
                scenario: &self.scenario,
                model: self.model,
                bound: self.bound,
            })
    }
}
