//! Growth formulas used to turn a reproduction number into an epidemic doubling time, a
//! one-day growth factor and a nosocomial split.
//!
//! Three historical formulations coexist in the literature this model follows. They are
//! kept as named, interchangeable strategies behind [`GrowthFormula`]; one is chosen per
//! run through [`FormulaVariant`] and passed unchanged to every stage of that run.
//!
//! * [`RoyalSociety`] (default): the doubling time scales with the average infectious
//!   duration, `ln 2 / (Rt / t_avg)`, and the growth factor is the exact `2^(1/td) - 1`.
//! * [`SimplifiedDoublingTime`]: `ln 2 / Rt`, exact growth factor.
//! * [`Hill2020FixedSplit`]: Royal Society doubling time, first-order growth factor
//!   `ln 2 / td`, and transmission always split with the disease-wide share of infections
//!   among health care workers, ignoring any place-specific nosocomial proportion.

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::parameters::{DiseaseConstants, PlaceSeverityProfile};

/// Lower bound applied to the nosocomial proportion to keep the split finite.
pub const MIN_NOSOCOMIAL_PROPORTION: f64 = 1e-6;

pub trait GrowthFormula {
    /// Days for case counts to double under the current growth.
    fn doubling_time(&self, rt: f64, average_infectious_duration: f64) -> f64;

    /// Relative increase of the infectious population over one day.
    fn daily_growth_factor(&self, doubling_time: f64) -> f64 {
        2f64.powf(1.0 / doubling_time) - 1.0
    }

    /// Share of transmission attributed to hospitalized cases, clamped away from zero.
    fn nosocomial_proportion(
        &self,
        profile: &PlaceSeverityProfile,
        constants: &DiseaseConstants,
    ) -> f64 {
        profile
            .nosocomial_proportion
            .unwrap_or(constants.infected_health_care_proportion)
            .max(MIN_NOSOCOMIAL_PROPORTION)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoyalSociety;

impl GrowthFormula for RoyalSociety {
    fn doubling_time(&self, rt: f64, average_infectious_duration: f64) -> f64 {
        LN_2 / (rt / average_infectious_duration)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifiedDoublingTime;

impl GrowthFormula for SimplifiedDoublingTime {
    fn doubling_time(&self, rt: f64, _average_infectious_duration: f64) -> f64 {
        LN_2 / rt
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hill2020FixedSplit;

impl GrowthFormula for Hill2020FixedSplit {
    fn doubling_time(&self, rt: f64, average_infectious_duration: f64) -> f64 {
        RoyalSociety.doubling_time(rt, average_infectious_duration)
    }

    fn daily_growth_factor(&self, doubling_time: f64) -> f64 {
        LN_2 / doubling_time
    }

    fn nosocomial_proportion(
        &self,
        _profile: &PlaceSeverityProfile,
        constants: &DiseaseConstants,
    ) -> f64 {
        constants
            .infected_health_care_proportion
            .max(MIN_NOSOCOMIAL_PROPORTION)
    }
}

/// Selects a [`GrowthFormula`] by name, e.g. from a configuration file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormulaVariant {
    #[default]
    RoyalSociety,
    SimplifiedDoublingTime,
    Hill2020FixedSplit,
}

impl FormulaVariant {
    #[must_use]
    pub fn formula(self) -> &'static dyn GrowthFormula {
        match self {
            FormulaVariant::RoyalSociety => &RoyalSociety,
            FormulaVariant::SimplifiedDoublingTime => &SimplifiedDoublingTime,
            FormulaVariant::Hill2020FixedSplit => &Hill2020FixedSplit,
        }
    }
}
