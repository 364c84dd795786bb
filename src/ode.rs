//! Classic fixed-step fourth-order Runge-Kutta integration for small systems held in
//! fixed-size arrays.
//!
//! A fixed step keeps runs deterministic: the same inputs always take the same sequence of
//! floating point operations. RK4 also preserves linear invariants of the system (such as a
//! conserved total) up to rounding, since each stage is a linear combination of
//! derivatives that individually satisfy them.

/// Stage buffers for [`Rk4::step`], allocated once per integration.
#[derive(Debug, Clone)]
pub struct Rk4<const N: usize> {
    k1: [f64; N],
    k2: [f64; N],
    k3: [f64; N],
    k4: [f64; N],
    ytmp: [f64; N],
}

impl<const N: usize> Default for Rk4<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Rk4<N> {
    #[must_use]
    pub fn new() -> Self {
        Rk4 {
            k1: [0.0; N],
            k2: [0.0; N],
            k3: [0.0; N],
            k4: [0.0; N],
            ytmp: [0.0; N],
        }
    }

    /// Advances `y` from `t` to `t + dt` for the autonomous-or-not system `f(t, y, dy)`.
    pub fn step<F>(&mut self, y: &mut [f64; N], t: f64, dt: f64, mut f: F)
    where
        F: FnMut(f64, &[f64; N], &mut [f64; N]),
    {
        f(t, y, &mut self.k1);

        for i in 0..N {
            self.ytmp[i] = y[i] + 0.5 * dt * self.k1[i];
        }
        f(t + 0.5 * dt, &self.ytmp, &mut self.k2);

        for i in 0..N {
            self.ytmp[i] = y[i] + 0.5 * dt * self.k2[i];
        }
        f(t + 0.5 * dt, &self.ytmp, &mut self.k3);

        for i in 0..N {
            self.ytmp[i] = y[i] + dt * self.k3[i];
        }
        f(t + dt, &self.ytmp, &mut self.k4);

        for i in 0..N {
            y[i] += (dt / 6.0) * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }

    /// Integrates from `t0` to `t0 + 1` in `substeps` equal steps.
    pub fn advance_unit<F>(&mut self, y: &mut [f64; N], t0: f64, substeps: usize, mut f: F)
    where
        F: FnMut(f64, &[f64; N], &mut [f64; N]),
    {
        #[allow(clippy::cast_precision_loss)]
        let dt = 1.0 / substeps as f64;
        for k in 0..substeps {
            #[allow(clippy::cast_precision_loss)]
            let t = t0 + k as f64 * dt;
            self.step(y, t, dt, &mut f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;

    #[test]
    fn exponential_decay_is_accurate() {
        let mut rk4 = Rk4::<1>::new();
        let mut y = [1.0];
        for day in 0..5 {
            rk4.advance_unit(&mut y, f64::from(day), 10, |_, y, dy| dy[0] = -0.5 * y[0]);
        }
        // global error of RK4 at dt = 0.1 is about 1e-8
        assert_almost_eq!(y[0], (-2.5f64).exp(), 1e-7);
    }

    #[test]
    fn time_dependent_rhs_sees_stage_times() {
        // y' = t, y(0) = 0 => y(1) = 1/2, exact for RK4
        let mut rk4 = Rk4::<1>::new();
        let mut y = [0.0];
        rk4.step(&mut y, 0.0, 1.0, |t, _, dy| dy[0] = t);
        assert_almost_eq!(y[0], 0.5, 1e-15);
    }

    #[test]
    fn linear_invariant_is_preserved() {
        // Two-compartment exchange conserves the total.
        let mut rk4 = Rk4::<2>::new();
        let mut y = [900.0, 100.0];
        for day in 0..50 {
            rk4.advance_unit(&mut y, f64::from(day), 4, |_, y, dy| {
                let flow = 0.3 * y[0] * y[1] / 1_000.0;
                dy[0] = -flow;
                dy[1] = flow;
            });
        }
        assert_almost_eq!(y[0] + y[1], 1_000.0, 1e-9);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let run = || {
            let mut rk4 = Rk4::<2>::new();
            let mut y = [1.0, 0.0];
            for day in 0..10 {
                rk4.advance_unit(&mut y, f64::from(day), 7, |_, y, dy| {
                    dy[0] = -y[1];
                    dy[1] = y[0];
                });
            }
            y
        };
        assert_eq!(run(), run());
    }
}
