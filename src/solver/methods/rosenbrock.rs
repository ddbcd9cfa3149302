//! Rosenbrock 2(3) integrator for stiff kinetics
//!
//! # Mathematical Background
//!
//! Linearly implicit embedded pair (the modified Rosenbrock formula of
//! Shampine and Reichelt). Each step solves three linear systems sharing the
//! matrix `W = I − h·d·J`, with `J = ∂f/∂y` from
//! [`PhysicalModel::jacobian`], so no Newton iteration is needed:
//!
//! ```text
//! d = 1/(2 + √2),  e₃₂ = 6 + √2,  T = ∂f/∂t
//!
//! W·k₁ = f₀ + h·d·T                                  f₀ = f(tₙ, yₙ)
//! W·(k₂ − k₁) = f₁ − k₁                              f₁ = f(tₙ + h/2, yₙ + h/2·k₁)
//! yₙ₊₁ = yₙ + h·k₂
//! W·k₃ = f₂ − e₃₂·(k₂ − f₁) − 2·(k₁ − f₀) + h·d·T    f₂ = f(tₙ₊₁, yₙ₊₁)
//!
//! err = h/6 · (k₁ − 2·k₂ + k₃)
//! ```
//!
//! The second-order solution advances; `f₂` is reused as the next `f₀`.
//! The method is L-stable: the admissible step follows the accuracy of the
//! slow components only, however fast the substrate relaxes.
//!
//! Step control uses the same weighted RMS norm as Dormand-Prince with
//! `h_new = h · clamp(0.9·‖err‖^(−1/3), 0.2, 5)`.
//!
//! # Dense Output
//!
//! ```text
//! s = (t − tₙ)/h
//! y(t) = yₙ + h·( s(1 − s)·k₁ + s(s − 2d)·k₂ ) / (1 − 2d)
//! ```
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::models::{FermentationModel, Phase, SimulationParameters};
//! use ferm_rs::solver::{Integrator, Rosenbrock23};
//!
//! let params = SimulationParameters::default().with_half_saturation(1e-6);
//! let model = FermentationModel::new(params.kinetic_constants().unwrap(), Phase::Batch);
//!
//! let mut solution = Rosenbrock23::new()
//!     .integrate(&model, params.initial_state(), 1000.0)
//!     .unwrap();
//!
//! // Well past exhaustion the substrate sits at zero
//! let state = solution.solve(40.0).unwrap();
//! assert!(state.substrate().abs() < 1e-6);
//! ```

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::SQRT_2;

use crate::error::{SimResult, SimulationError};
use crate::physics::{PhysicalModel, StateVector};
use crate::solver::traits::{check_range, check_start};
use crate::solver::{DenseSolution, Integrator};

// =================================================================================================
// Method Coefficients
// =================================================================================================

const D: f64 = 1.0 / (2.0 + SQRT_2);
const E32: f64 = 6.0 + SQRT_2;

// Step controller
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;
const MIN_STEP_RELATIVE: f64 = 1e-12;

// =================================================================================================
// Rosenbrock Integrator
// =================================================================================================

/// Adaptive Rosenbrock 2(3) integrator
///
/// # Defaults
///
/// | Parameter      | Value    |
/// |----------------|----------|
/// | `rtol`         | 1e-8     |
/// | `atol`         | 1e-9     |
/// | `initial_step` | 1e-2     |
/// | `max_steps`    | 100 000  |
///
/// The method is second order: the tolerances sit below the Dormand-Prince
/// defaults so that sampled values stay within 1e-4 relative error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rosenbrock23 {
    rtol: f64,
    atol: f64,
    initial_step: f64,
    max_steps: usize,
}

impl Default for Rosenbrock23 {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-9,
            initial_step: 1e-2,
            max_steps: 100_000,
        }
    }
}

impl Rosenbrock23 {
    /// Create an integrator with default tolerances
    ///
    /// # Example
    ///
    /// ```rust
    /// use ferm_rs::solver::{Integrator, Rosenbrock23};
    ///
    /// let integrator = Rosenbrock23::new();
    /// assert_eq!(integrator.name(), "Rosenbrock 2(3)");
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

impl Integrator for Rosenbrock23 {
    fn integrate<'a>(
        &self,
        model: &'a dyn PhysicalModel,
        initial: StateVector,
        horizon: f64,
    ) -> SimResult<Box<dyn DenseSolution + 'a>> {
        check_start(&initial, horizon)?;

        let derivative = model.compute_physics(0.0, &initial)?;

        Ok(Box::new(Rosenbrock23Solution {
            model,
            options: *self,
            horizon,
            initial,
            t: 0.0,
            y: *initial.as_vector(),
            f0: *derivative.as_vector(),
            h: self.initial_step.min(horizon),
            attempts: 0,
            segments: Vec::new(),
        }))
    }

    fn name(&self) -> &str {
        "Rosenbrock 2(3)"
    }
}

// =================================================================================================
// Dense Solution
// =================================================================================================

/// Interpolant of one accepted step
#[derive(Debug, Clone, Copy)]
struct RosenbrockSegment {
    t0: f64,
    h: f64,
    y0: Vector3<f64>,
    k1: Vector3<f64>,
    k2: Vector3<f64>,
}

impl RosenbrockSegment {
    fn end(&self) -> f64 {
        self.t0 + self.h
    }

    fn evaluate(&self, t: f64) -> Vector3<f64> {
        let s = ((t - self.t0) / self.h).clamp(0.0, 1.0);
        let scale = self.h / (1.0 - 2.0 * D);

        self.y0 + (self.k1 * (s * (1.0 - s)) + self.k2 * (s * (s - 2.0 * D))) * scale
    }
}

/// Lazily advanced Rosenbrock trajectory
pub struct Rosenbrock23Solution<'a> {
    model: &'a dyn PhysicalModel,
    options: Rosenbrock23,
    horizon: f64,
    initial: StateVector,

    // ====== Step state ======
    t: f64,
    y: Vector3<f64>,
    f0: Vector3<f64>,
    h: f64,
    attempts: usize,

    segments: Vec<RosenbrockSegment>,
}

impl Rosenbrock23Solution<'_> {
    fn stage(&self, t: f64, y: Vector3<f64>) -> SimResult<Vector3<f64>> {
        let derivative = self.model.compute_physics(t, &StateVector::from_vector(y))?;
        derivative.validate(t)?;
        Ok(*derivative.as_vector())
    }

    /// Forward difference ∂f/∂t at the current point
    fn time_derivative(&self) -> SimResult<Vector3<f64>> {
        let delta = f64::EPSILON.sqrt() * self.t.abs().max(1.0);
        let shifted = self.stage(self.t + delta, self.y)?;
        Ok((shifted - self.f0) / delta)
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
    ///
    /// The Jacobian and ∂f/∂t are evaluated once per step and reused by
    /// every retry.
    fn advance(&mut self) -> SimResult<()> {
        let (t, y, f0) = (self.t, self.y, self.f0);
        StateVector::from_vector(f0).validate(t)?;

        let jacobian = self.model.jacobian(t, &StateVector::from_vector(y))?;
        let dfdt = self.time_derivative()?;
        let mut rejected = false;

        loop {
            if self.attempts >= self.options.max_steps {
                return Err(SimulationError::MaxStepsExceeded {
                    steps: self.options.max_steps,
                    time: self.t,
                });
            }
            self.attempts += 1;

            let h = self.h.min(self.horizon - t);
            if h <= MIN_STEP_RELATIVE * t.abs().max(1.0) {
                return Err(SimulationError::StepSizeTooSmall { time: t });
            }

            let Some(w_inverse) = (Matrix3::identity() - jacobian * (h * D)).try_inverse() else {
                rejected = true;
                self.h = h * MIN_FACTOR;
                continue;
            };
            let forcing = dfdt * (h * D);

            // ====== Stages ======

            let k1 = w_inverse * (f0 + forcing);
            let f1 = self.stage(t + 0.5 * h, y + k1 * (0.5 * h))?;
            let k2 = w_inverse * (f1 - k1) + k1;

            let y_new = y + k2 * h;
            let f2 = self.stage(t + h, y_new)?;

            let k3 = w_inverse * (f2 - (k2 - f1) * E32 - (k1 - f0) * 2.0 + forcing);

            // ====== Error control ======

            let error = (k1 - k2 * 2.0 + k3) * (h / 6.0);
            let norm = self.error_norm(&error, &y_new);

            let factor = if !norm.is_finite() {
                MIN_FACTOR
            } else if norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * norm.powf(-1.0 / 3.0)).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if norm <= 1.0 {
                // ====== Accept ======

                self.segments.push(RosenbrockSegment { t0: t, h, y0: y, k1, k2 });

                self.t = if self.horizon - (t + h) <= MIN_STEP_RELATIVE * self.horizon {
                    self.horizon
                } else {
                    t + h
                };
                self.y = y_new;
                self.f0 = f2;

                // No growth right after a rejection
                self.h = if rejected { h * factor.min(1.0) } else { h * factor };
                return Ok(());
            }

            rejected = true;
            self.h = h * factor;
        }
    }
}

impl DenseSolution for Rosenbrock23Solution<'_> {
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
