//! Compartments of the SEAPMDR family and the two model variants built from them.
//!
//! Every state vector in the crate uses the same fixed ordering, given by the discriminants
//! of [`Compartment`]. The core variant shares that ordering and simply never populates the
//! asymptomatic compartment `I0`, so one right-hand side serves both variants.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

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
    EnumIter,
    EnumCount,
    Serialize,
    Deserialize,
)]
pub enum Compartment {
    /// Susceptible
    S,
    /// Exposed, latent (not yet infectious)
    E0,
    /// Exposed, pre-symptomatic (infectious)
    E1,
    /// Infected, asymptomatic
    I0,
    /// Infected, mild
    I1,
    /// Infected, severe (general hospital bed)
    I2,
    /// Infected, critical (ICU bed)
    I3,
    /// Recovered
    R,
    /// Deaths
    D,
}

/// Number of slots in a state vector.
pub const N_COMPARTMENTS: usize = Compartment::COUNT;

impl Compartment {
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Compartments that contribute to the force of infection.
    #[must_use]
    pub fn is_infectious(self) -> bool {
        matches!(
            self,
            Compartment::E1 | Compartment::I0 | Compartment::I1 | Compartment::I2 | Compartment::I3
        )
    }

    /// Infectious compartments cared for in hospital. Transmission from them is nosocomial.
    #[must_use]
    pub fn is_hospitalized(self) -> bool {
        matches!(self, Compartment::I2 | Compartment::I3)
    }
}

/// Which flavour of the compartmental model to integrate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
pub enum ModelVariant {
    /// SEIR-like core: no asymptomatic compartment, asymptomatic and mild cases share `I1`.
    #[serde(rename = "SEIR")]
    #[strum(serialize = "SEIR", ascii_case_insensitive)]
    Core,
    /// SEAPMDR: infectious individuals split into asymptomatic, mild, severe and critical.
    #[default]
    #[serde(rename = "SEAPMDR")]
    #[strum(serialize = "SEAPMDR", ascii_case_insensitive)]
    Extended,
}

impl ModelVariant {
    /// Whether the variant tracks `I0` separately.
    #[must_use]
    pub fn has_asymptomatic(self) -> bool {
        matches!(self, ModelVariant::Extended)
    }

    /// The compartments reported for this variant, in state-vector order.
    #[must_use]
    pub fn compartments(self) -> Vec<Compartment> {
        Compartment::iter()
            .filter(|c| self.has_asymptomatic() || *c != Compartment::I0)
            .collect()
    }
}
