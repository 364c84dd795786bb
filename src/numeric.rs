//! Floating point comparisons used by the invariant checks and the test suite. Thin wrappers
//! around the `approx` crate.

use approx::{AbsDiffEq, RelativeEq};

/// Relative tolerance for population conservation checks.
pub const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Compares two floats relative to the larger magnitude of the pair.
#[must_use]
pub fn relative_eq(a: f64, b: f64, max_relative: f64) -> bool {
    a.relative_eq(&b, f64::EPSILON, max_relative)
}

/// Index of the first non-finite entry of `values`, if any.
#[must_use]
pub fn first_non_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}
