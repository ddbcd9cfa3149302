//! Dormand-Prince 5(4) adaptive integrator with dense output
//!
//! # Mathematical Background
//!
//! Explicit embedded Runge-Kutta pair: seven stages produce a fifth-order
//! solution (used to advance, "local extrapolation") and a fourth-order one
//! whose difference drives step-size control. The last stage is evaluated at
//! the new point, so it is reused as the first stage of the next step
//! (FSAL: first same as last) and each accepted step costs six evaluations.
//!
//! ```text
//! err  = h · Σ eᵢ·kᵢ
//! ‖err‖ = sqrt( mean( (errᵢ / (atol + rtol·max(|yᵢ|, |ŷᵢ|)))² ) )
//! accept if ‖err‖ ≤ 1,  h_new = h · clamp(0.9·‖err‖^(−1/5), 0.2, 5)
//! ```
//!
//! # Dense Output
//!
//! Every accepted step stores the coefficients of the method's fourth-order
//! continuous extension, so the trajectory can be evaluated at any time
//! inside an accepted step with no extra function evaluations:
//!
//! ```text
//! θ = (t − tₙ)/h,  θ₁ = 1 − θ
//! y(t) = r₀ + θ·(r₁ + θ₁·(r₂ + θ·(r₃ + θ₁·r₄)))
//! ```
//!
//! # Laziness
//!
//! [`DormandPrinceSolution`] only advances when asked for a time beyond the
//! last accepted step. A phase that stops early never pays for, or overflows
//! in, the part of the horizon it does not sample.
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::models::{FermentationModel, Phase, SimulationParameters};
//! use ferm_rs::solver::{DormandPrince, Integrator};
//!
//! let params = SimulationParameters::default();
//! let model = FermentationModel::new(params.kinetic_constants().unwrap(), Phase::Batch);
//!
//! let integrator = DormandPrince::new();
//! let mut solution = integrator.integrate(&model, params.initial_state(), 1000.0).unwrap();
//!
//! let state = solution.solve(10.0).unwrap();
//! assert!(state.biomass() > params.initial_biomass());
//! ```

use nalgebra::Vector3;

use crate::error::{SimResult, SimulationError};
use crate::physics::{PhysicalModel, StateVector};
use crate::solver::traits::{check_range, check_start};
use crate::solver::{DenseSolution, Integrator};

// =================================================================================================
// Butcher Tableau
// =================================================================================================

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (advancing solution)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 5th minus 4th order weights (error estimate)
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// Continuous extension
const D1: f64 = -12715105075.0 / 11282082432.0;
const D3: f64 = 87487479700.0 / 32700410799.0;
const D4: f64 = -10690763975.0 / 1880347072.0;
const D5: f64 = 701980252875.0 / 199316789632.0;
const D6: f64 = -1453857185.0 / 822651844.0;
const D7: f64 = 69997945.0 / 29380423.0;

// Step controller
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;
const MIN_STEP_RELATIVE: f64 = 1e-12;

// =================================================================================================
// Dormand-Prince Integrator
// =================================================================================================

/// Adaptive Dormand-Prince 5(4) integrator
///
/// # Defaults
///
/// | Parameter      | Value    |
/// |----------------|----------|
/// | `rtol`         | 1e-6     |
/// | `atol`         | 1e-8     |
/// | `initial_step` | 1e-2     |
/// | `max_steps`    | 100 000  |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DormandPrince {
    rtol: f64,
    atol: f64,
    initial_step: f64,
    max_steps: usize,
}

impl Default for DormandPrince {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
            initial_step: 1e-2,
            max_steps: 100_000,
        }
    }
}

impl DormandPrince {
    /// Create an integrator with default tolerances
    ///
    /// # Example
    ///
    /// ```rust
    /// use ferm_rs::solver::{DormandPrince, Integrator};
    ///
    /// let integrator = DormandPrince::new();
    /// assert_eq!(integrator.name(), "Dormand-Prince 5(4)");
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Set relative and absolute tolerances
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    /// Set the first trial step size (h)
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }

    /// Set the limit on attempted steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl Integrator for DormandPrince {
    fn integrate<'a>(
        &self,
        model: &'a dyn PhysicalModel,
        initial: StateVector,
        horizon: f64,
    ) -> SimResult<Box<dyn DenseSolution + 'a>> {
        check_start(&initial, horizon)?;

        let k1 = *model.compute_physics(0.0, &initial)?.as_vector();

        Ok(Box::new(DormandPrinceSolution {
            model,
            options: *self,
            horizon,
            initial,
            t: 0.0,
            y: *initial.as_vector(),
            k1,
            h: self.initial_step.min(horizon),
            attempts: 0,
            segments: Vec::new(),
        }))
    }

    fn name(&self) -> &str {
        "Dormand-Prince 5(4)"
    }
}

// =================================================================================================
// Dense Solution
// =================================================================================================

/// Interpolant of one accepted step
#[derive(Debug, Clone, Copy)]
struct DenseSegment {
    t0: f64,
    h: f64,
    r: [Vector3<f64>; 5],
}

impl DenseSegment {
    fn end(&self) -> f64 {
        self.t0 + self.h
    }

    fn evaluate(&self, t: f64) -> Vector3<f64> {
        let theta = ((t - self.t0) / self.h).clamp(0.0, 1.0);
        let theta1 = 1.0 - theta;
        let [r0, r1, r2, r3, r4] = self.r;

        r0 + (r1 + (r2 + (r3 + r4 * theta1) * theta) * theta1) * theta
    }
}

/// Lazily advanced Dormand-Prince trajectory
pub struct DormandPrinceSolution<'a> {
    model: &'a dyn PhysicalModel,
    options: DormandPrince,
    horizon: f64,
    initial: StateVector,

    // ====== Step state ======
    t: f64,
    y: Vector3<f64>,
    k1: Vector3<f64>,
    h: f64,
    attempts: usize,

    segments: Vec<DenseSegment>,
}

impl DormandPrinceSolution<'_> {
    fn stage(&self, t: f64, y: Vector3<f64>) -> SimResult<Vector3<f64>> {
        let derivative = self.model.compute_physics(t, &StateVector::from_vector(y))?;
        Ok(*derivative.as_vector())
    }

    /// Weighted RMS error norm
    fn error_norm(&self, error: &Vector3<f64>, y_new: &Vector3<f64>) -> f64 {
        let sum: f64 = (0..3)
            .map(|i| {
                let scale =
                    self.options.atol + self.options.rtol * self.y[i].abs().max(y_new[i].abs());
                (error[i] / scale).powi(2)
            })
            .sum();
        (sum / 3.0).sqrt()
    }

    /// Advance by one accepted step, retrying with smaller steps on rejection
    fn advance(&mut self) -> SimResult<()> {
        let mut rejected = false;

        loop {
            if self.attempts >= self.options.max_steps {
                return Err(SimulationError::MaxStepsExceeded {
                    steps: self.options.max_steps,
                    time: self.t,
                });
            }
            self.attempts += 1;

            let h = self.h.min(self.horizon - self.t);
            if h <= MIN_STEP_RELATIVE * self.t.abs().max(1.0) {
                return Err(SimulationError::StepSizeTooSmall { time: self.t });
            }

            let (t, y, k1) = (self.t, self.y, self.k1);

            // ====== Stages ======

            let k2 = self.stage(t + C2 * h, y + k1 * (h * A21))?;
            let k3 = self.stage(t + C3 * h, y + (k1 * A31 + k2 * A32) * h)?;
            let k4 = self.stage(t + C4 * h, y + (k1 * A41 + k2 * A42 + k3 * A43) * h)?;
            let k5 = self.stage(
                t + C5 * h,
                y + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h,
            )?;
            let k6 = self.stage(
                t + h,
                y + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h,
            )?;

            let y_new = y + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;

            // FSAL stage
            let k7 = self.stage(t + h, y_new)?;

            // ====== Error control ======

            let error = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
            let norm = self.error_norm(&error, &y_new);

            let factor = if !norm.is_finite() {
                MIN_FACTOR
            } else if norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if norm <= 1.0 {
                // ====== Accept ======

                let y_diff = y_new - y;
                let b_spline = k1 * h - y_diff;
                self.segments.push(DenseSegment {
                    t0: t,
                    h,
                    r: [
                        y,
                        y_diff,
                        b_spline,
                        y_diff - k7 * h - b_spline,
                        (k1 * D1 + k3 * D3 + k4 * D4 + k5 * D5 + k6 * D6 + k7 * D7) * h,
                    ],
                });

                self.t = if self.horizon - (t + h) <= MIN_STEP_RELATIVE * self.horizon {
                    self.horizon
                } else {
                    t + h
                };
                self.y = y_new;
                self.k1 = k7;

                // No growth right after a rejection
                self.h = if rejected { h * factor.min(1.0) } else { h * factor };
                return Ok(());
            }

            rejected = true;
            self.h = h * factor;
        }
    }
}

impl DenseSolution for DormandPrinceSolution<'_> {
    fn solve(&mut self, t: f64) -> SimResult<StateVector> {
        check_range(t, self.horizon)?;
        let t = t.clamp(0.0, self.horizon);

        while self.t < t {
            self.advance()?;
        }

        if self.segments.is_empty() {
            return Ok(self.initial);
        }

        let index = self
            .segments
            .partition_point(|segment| segment.end() < t)
            .min(self.segments.len() - 1);

        let state = StateVector::from_vector(self.segments[index].evaluate(t));
        state.validate(t)?;
        Ok(state)
    }

    fn horizon(&self) -> f64 {
        self.horizon
    }

    fn steps(&self) -> usize {
        self.segments.len()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
