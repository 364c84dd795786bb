//! Right-hand side of the SEAPMDR equations.
//!
//! ```text
//! λ    = βE·E1 + β0·I0 + β1·I1 + β2·I2 + β3·I3
//! S'   = -λ·S
//! E0'  =  λ·S - σ0·E0
//! E1'  =  σ0·E0 - σ1·E1
//! I0'  =  φ·σ1·E1 - γ0·I0
//! I1'  =  (1 - φ)·σ1·E1 - (γ1 + p1)·I1
//! I2'  =  p1·I1 - (γ2 + p2)·I2
//! I3'  =  p2·I2 - (γ3 + μ)·I3
//! R'   =  γ0·I0 + γ1·I1 + γ2·I2 + γ3·I3
//! D'   =  μ·I3
//! ```
//!
//! The core SEIR variant is the same system with `φ = 0` and `I0 = 0`. Every outflow is
//! another compartment's inflow, so the derivatives sum to zero.

use crate::compartment::{Compartment, N_COMPARTMENTS};
use crate::rates::DerivedRates;

/// Per-capita force of infection acting on the susceptible population.
#[must_use]
pub fn force_of_infection(rates: &DerivedRates, y: &[f64; N_COMPARTMENTS]) -> f64 {
    rates.beta_e * y[Compartment::E1.index()]
        + rates.beta0 * y[Compartment::I0.index()]
        + rates.beta1 * y[Compartment::I1.index()]
        + rates.beta2 * y[Compartment::I2.index()]
        + rates.beta3 * y[Compartment::I3.index()]
}

/// Writes the time derivative of `y` into `dy`.
pub fn derivatives(rates: &DerivedRates, y: &[f64; N_COMPARTMENTS], dy: &mut [f64; N_COMPARTMENTS]) {
    let [s, e0, e1, i0, i1, i2, i3, _r, _d] = *y;

    let infections = force_of_infection(rates, y) * s;
    let onsets = rates.sigma1 * e1;

    dy[Compartment::S.index()] = -infections;
    dy[Compartment::E0.index()] = infections - rates.sigma0 * e0;
    dy[Compartment::E1.index()] = rates.sigma0 * e0 - onsets;
    dy[Compartment::I0.index()] = rates.phi * onsets - rates.gamma0 * i0;
    dy[Compartment::I1.index()] = (1.0 - rates.phi) * onsets - (rates.gamma1 + rates.p1) * i1;
    dy[Compartment::I2.index()] = rates.p1 * i1 - (rates.gamma2 + rates.p2) * i2;
    dy[Compartment::I3.index()] = rates.p2 * i2 - (rates.gamma3 + rates.mu) * i3;
    dy[Compartment::R.index()] =
        rates.gamma0 * i0 + rates.gamma1 * i1 + rates.gamma2 * i2 + rates.gamma3 * i3;
    dy[Compartment::D.index()] = rates.mu * i3;
}
