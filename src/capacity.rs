//! Days until projected hospital demand exceeds the available beds.

use serde::Serialize;

use crate::compartment::Compartment;
use crate::scenario::{Bound, BoundPair, ScenarioResults};
use crate::trajectory::Trajectory;

/// Written in place of a day count when capacity is never exceeded.
pub const NOT_EXCEEDED: i64 = -1;

/// The first 1-based day (`dias`) on which `compartment` is strictly above `capacity`.
#[must_use]
pub fn days_until_exceeded(
    trajectory: &Trajectory,
    compartment: Compartment,
    capacity: f64,
) -> Option<usize> {
    trajectory
        .series(compartment)
        .position(|value| value > capacity)
        .map(|index| index + 1)
}

/// Capacity indicator of one bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityDay {
    /// First 1-based day on which demand is above capacity.
    Exceeded(usize),
    /// Not exceeded within the horizon, or the capacity is unknown.
    NotExceeded,
    /// The bound's integration failed, so there is no trajectory to compare.
    Failed,
}

impl CapacityDay {
    #[must_use]
    pub fn exceeded(self) -> Option<usize> {
        match self {
            CapacityDay::Exceeded(day) => Some(day),
            CapacityDay::NotExceeded | CapacityDay::Failed => None,
        }
    }

    /// The published value: the day, [`NOT_EXCEEDED`], or `None` for a failed bound.
    #[must_use]
    pub fn published(self) -> Option<i64> {
        match self {
            CapacityDay::Exceeded(day) => Some(i64::try_from(day).unwrap_or(i64::MAX)),
            CapacityDay::NotExceeded => Some(NOT_EXCEEDED),
            CapacityDay::Failed => None,
        }
    }
}

/// Days until severe cases exceed beds and critical cases exceed ICU beds, per bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dday {
    pub beds: BoundPair<CapacityDay>,
    pub icu_beds: BoundPair<CapacityDay>,
}

/// [`Dday`] as published: [`NOT_EXCEEDED`] when capacity holds, `null` for a failed bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DdaySummary {
    pub beds: BoundPair<Option<i64>>,
    pub icu_beds: BoundPair<Option<i64>>,
}

impl Dday {
    #[must_use]
    pub fn summary(&self) -> DdaySummary {
        DdaySummary {
            beds: self.beds.map(|_, day| day.published()),
            icu_beds: self.icu_beds.map(|_, day| day.published()),
        }
    }
}

/// Computes the capacity indicator of both bounds.
#[must_use]
pub fn dday(results: &ScenarioResults, n_beds: Option<f64>, n_icu_beds: Option<f64>) -> Dday {
    let indicator = |compartment: Compartment, capacity: Option<f64>| {
        let exceeded = |bound: Bound| {
            let Ok(trajectory) = results.get(bound) else {
                return CapacityDay::Failed;
            };
            capacity
                .and_then(|capacity| days_until_exceeded(trajectory, compartment, capacity))
                .map_or(CapacityDay::NotExceeded, CapacityDay::Exceeded)
        };
        BoundPair {
            worst: exceeded(Bound::Worst),
            best: exceeded(Bound::Best),
        }
    };
    Dday {
        beds: indicator(Compartment::I2, n_beds),
        icu_beds: indicator(Compartment::I3, n_icu_beds),
    }
}
