//! Runge-Kutta 4 (RK4) fixed-step integrator
//!
//! # Mathematical Background
//!
//! The classical fourth-order Runge-Kutta method uses a weighted average of
//! four slope estimates per step:
//!
//! ```text
//! k₁ = f(tₙ, yₙ)
//! k₂ = f(tₙ + h/2, yₙ + h/2 * k₁)
//! k₃ = f(tₙ + h/2, yₙ + h/2 * k₂)
//! k₄ = f(tₙ + h,   yₙ + h * k₃)
//!
//! yₙ₊₁ = yₙ + h/6 * (k₁ + 2k₂ + 2k₃ + k₄)
//! ```
//!
//! # Dense Output
//!
//! Between grid points the trajectory is a cubic Hermite interpolant built
//! from the end values and end slopes of each step. The end slope
//! `f(tₙ₊₁, yₙ₊₁)` is the next step's k₁, so interpolation costs no extra
//! evaluations.
//!
//! # Characteristics
//!
//! | Property    | Value                   |
//! |-------------|-------------------------|
//! | Order       | 4 (global error O(h⁴))  |
//! | Evals/step  | 4                       |
//! | Step size   | Fixed                   |
//!
//! No error control: a step that is too large for the fed phase's
//! exponential feed silently loses accuracy. Use [`Rosenbrock23`] unless a
//! fixed, reproducible grid is required.
//!
//! [`Rosenbrock23`]: crate::solver::Rosenbrock23
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::models::{FermentationModel, Phase, SimulationParameters};
//! use ferm_rs::solver::{Integrator, RK4Integrator};
//!
//! let params = SimulationParameters::default();
//! let model = FermentationModel::new(params.kinetic_constants().unwrap(), Phase::Batch);
//!
//! let mut solution = RK4Integrator::new(0.01)
//!     .integrate(&model, params.initial_state(), 1000.0)
//!     .unwrap();
//!
//! let state = solution.solve(5.0).unwrap();
//! assert!(state.substrate() < params.initial_substrate);
//! ```

use nalgebra::Vector3;

use crate::error::SimResult;
use crate::physics::{PhysicalModel, StateVector};
use crate::solver::traits::{check_range, check_start};
use crate::solver::{DenseSolution, Integrator};

// =================================================================================================
// RK4 Integrator
// =================================================================================================

/// Classical fourth-order Runge-Kutta integrator at a fixed step
///
/// Grid points are computed from the step index (`tₙ = n·h`) and the last
/// step is shortened to land exactly on the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RK4Integrator {
    step: f64,
}

impl Default for RK4Integrator {
    fn default() -> Self {
        Self { step: 0.01 }
    }
}

impl RK4Integrator {
    /// Create an RK4 integrator with internal step `step` (h)
    ///
    /// # Example
    ///
    /// ```rust
    /// use ferm_rs::solver::{Integrator, RK4Integrator};
    ///
    /// let integrator = RK4Integrator::new(0.05);
    /// assert_eq!(integrator.name(), "Runge Kutta (RK4)");
    /// assert_eq!(integrator.step(), 0.05);
    /// ```
    pub fn new(step: f64) -> Self {
        Self { step }
    }

    /// Internal step size (h)
    pub fn step(&self) -> f64 {
        self.step
    }
}

impl Integrator for RK4Integrator {
    fn integrate<'a>(
        &self,
        model: &'a dyn PhysicalModel,
        initial: StateVector,
        horizon: f64,
    ) -> SimResult<Box<dyn DenseSolution + 'a>> {
        check_start(&initial, horizon)?;

        let step = self.step.min(horizon);
        let grid_points = (horizon / step - 1e-9).ceil().max(1.0) as usize;
        let k1 = *model.compute_physics(0.0, &initial)?.as_vector();

        Ok(Box::new(RK4Solution {
            model,
            step,
            horizon,
            grid_points,
            initial,
            index: 0,
            y: *initial.as_vector(),
            k1,
            segments: Vec::new(),
        }))
    }

    fn name(&self) -> &str {
        "Runge Kutta (RK4)"
    }
}

// =================================================================================================
// Dense Solution
// =================================================================================================

/// Cubic Hermite interpolant of one step
#[derive(Debug, Clone, Copy)]
struct HermiteSegment {
    t0: f64,
    t1: f64,
    y0: Vector3<f64>,
    y1: Vector3<f64>,
    f0: Vector3<f64>,
    f1: Vector3<f64>,
}

impl HermiteSegment {
    fn evaluate(&self, t: f64) -> Vector3<f64> {
        let h = self.t1 - self.t0;
        let s = ((t - self.t0) / h).clamp(0.0, 1.0);
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        self.y0 * h00 + self.f0 * (h * h10) + self.y1 * h01 + self.f1 * (h * h11)
    }
}

/// Lazily advanced RK4 trajectory
struct RK4Solution<'a> {
    model: &'a dyn PhysicalModel,
    step: f64,
    horizon: f64,
    grid_points: usize,
    initial: StateVector,

    // ====== Step state ======
    index: usize,
    y: Vector3<f64>,
    k1: Vector3<f64>,

    segments: Vec<HermiteSegment>,
}

impl RK4Solution<'_> {
    fn grid_time(&self, index: usize) -> f64 {
        if index >= self.grid_points {
            self.horizon
        } else {
            index as f64 * self.step
        }
    }

    fn current_time(&self) -> f64 {
        self.grid_time(self.index)
    }

    fn stage(&self, t: f64, y: Vector3<f64>) -> SimResult<Vector3<f64>> {
        let derivative = self.model.compute_physics(t, &StateVector::from_vector(y))?;
        Ok(*derivative.as_vector())
    }

    fn advance(&mut self) -> SimResult<()> {
        let t = self.current_time();
        let t_next = self.grid_time(self.index + 1);
        let h = t_next - t;
        let (y, k1) = (self.y, self.k1);

        // ====== RK4 Stages ======

        // Stage 2: slope at midpoint using Euler prediction with k₁
        let k2 = self.stage(t + h / 2.0, y + k1 * (h / 2.0))?;

        // Stage 3: slope at midpoint using Euler prediction with k₂
        let k3 = self.stage(t + h / 2.0, y + k2 * (h / 2.0))?;

        // Stage 4: slope at end using Euler prediction with k₃
        let k4 = self.stage(t + h, y + k3 * h)?;

        // ====== RK4 Update ======

        // Simpson weights: 1/6 at the ends, 1/3 at the midpoints
        let y_next = y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
        StateVector::from_vector(y_next).validate(t_next)?;

        // End slope doubles as the next step's k₁
        let f_next = self.stage(t_next, y_next)?;

        self.segments.push(HermiteSegment {
            t0: t,
            t1: t_next,
            y0: y,
            y1: y_next,
            f0: k1,
            f1: f_next,
        });

        self.index += 1;
        self.y = y_next;
        self.k1 = f_next;
        Ok(())
    }
}

impl DenseSolution for RK4Solution<'_> {
    fn solve(&mut self, t: f64) -> SimResult<StateVector> {
        check_range(t, self.horizon)?;
        let t = t.clamp(0.0, self.horizon);

        while self.index < self.grid_points && self.current_time() < t {
            self.advance()?;
        }

        if self.segments.is_empty() {
            return Ok(self.initial);
        }

        let index = self
            .segments
            .partition_point(|segment| segment.t1 < t)
            .min(self.segments.len() - 1);

        Ok(StateVector::from_vector(self.segments[index].evaluate(t)))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use approx::assert_relative_eq;

    /// dy/dt = -k * y on every component
    struct ExponentialDecay {
        decay_rate: f64,
    }

    impl PhysicalModel for ExponentialDecay {
        fn compute_physics(&self, _t: f64, state: &StateVector) -> SimResult<StateVector> {
            Ok(*state * -self.decay_rate)
        }

        fn name(&self) -> &str {
            "Exponential Decay"
        }
    }

    /// dy/dt = c on every component
    struct ConstantGrowth {
        growth_rate: f64,
    }

    impl PhysicalModel for ConstantGrowth {
        fn compute_physics(&self, _t: f64, _state: &StateVector) -> SimResult<StateVector> {
            let c = self.growth_rate;
            Ok(StateVector::new(c, c, c))
        }

        fn name(&self) -> &str {
            "Constant Growth"
        }
    }

    struct NaNModel;

    impl PhysicalModel for NaNModel {
        fn compute_physics(&self, _t: f64, _state: &StateVector) -> SimResult<StateVector> {
            Ok(StateVector::new(f64::NAN, 0.0, 0.0))
        }

        fn name(&self) -> &str {
            "NaN Model"
        }
    }

    fn final_value(model: &dyn PhysicalModel, step: f64, horizon: f64) -> f64 {
        let mut solution = RK4Integrator::new(step)
            .integrate(model, StateVector::new(1.0, 1.0, 1.0), horizon)
            .unwrap();
        solution.solve(horizon).unwrap().biomass()
    }

    #[test]
    fn test_rk4_integrator_creation() {
        assert_eq!(RK4Integrator::new(0.1).name(), "Runge Kutta (RK4)");
        assert_eq!(RK4Integrator::default().step(), 0.01);
    }

    #[test]
    fn test_rk4_constant_growth_is_exact() {
        let model = ConstantGrowth { growth_rate: 2.0 };
        let mut solution = RK4Integrator::new(0.1)
            .integrate(&model, StateVector::zeros(), 10.0)
            .unwrap();

        // Linear in t, so grid points and interpolant are both exact
        assert_relative_eq!(solution.solve(10.0).unwrap().biomass(), 20.0, epsilon = 1e-10);
        assert_relative_eq!(solution.solve(3.33).unwrap().volume(), 6.66, epsilon = 1e-10);
    }

    #[test]
    fn test_rk4_exponential_decay() {
        let model = ExponentialDecay { decay_rate: 0.3 };
        let mut solution = RK4Integrator::new(0.1)
            .integrate(&model, StateVector::new(1.0, 1.0, 1.0), 20.0)
            .unwrap();

        for t in [1.0, 5.0, 10.0, 20.0, 2.55, 13.01] {
            let numerical = solution.solve(t).unwrap().biomass();
            let analytical = (-0.3 * t).exp();

            assert_relative_eq!(numerical, analytical, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_rk4_convergence() {
        let model = ExponentialDecay { decay_rate: 1.0 };
        let exact = (-5.0_f64).exp();

        let errors: Vec<f64> = [0.2, 0.1, 0.05]
            .iter()
            .map(|&h| (final_value(&model, h, 5.0) - exact).abs())
            .collect();

        // Fourth order: halving h divides the error by ~16
        for pair in errors.windows(2) {
            let ratio = pair[0] / pair[1];
            assert!(
                ratio > 12.0 && ratio < 20.0,
                "Convergence ratio {} is not fourth order",
                ratio
            );
        }
    }

    #[test]
    fn test_rk4_grid_lands_on_horizon() {
        let model = ConstantGrowth { growth_rate: 1.0 };
        let mut solution = RK4Integrator::new(0.3)
            .integrate(&model, StateVector::zeros(), 1.0)
            .unwrap();

        // 0.3 does not divide 1.0: the last step is shortened
        assert_relative_eq!(solution.solve(1.0).unwrap().biomass(), 1.0, epsilon = 1e-12);
        assert_eq!(solution.steps(), 4);
    }

    #[test]
    fn test_rk4_is_lazy() {
        let model = ExponentialDecay { decay_rate: 0.1 };
        let mut solution = RK4Integrator::new(0.5)
            .integrate(&model, StateVector::new(1.0, 1.0, 1.0), 1000.0)
            .unwrap();

        solution.solve(2.0).unwrap();
        assert_eq!(solution.steps(), 4);

        // Earlier times are interpolated, not re-integrated
        solution.solve(0.7).unwrap();
        assert_eq!(solution.steps(), 4);
    }

    #[test]
    fn test_rk4_detects_nan() {
        let mut solution = RK4Integrator::new(0.1)
            .integrate(&NaNModel, StateVector::new(1.0, 1.0, 1.0), 1.0)
            .unwrap();

        assert!(matches!(
            solution.solve(0.5),
            Err(SimulationError::Numerical { .. })
        ));
    }

    #[test]
    fn test_rk4_out_of_range() {
        let model = ConstantGrowth { growth_rate: 1.0 };
        let mut solution = RK4Integrator::new(0.1)
            .integrate(&model, StateVector::zeros(), 1.0)
            .unwrap();

        assert!(matches!(
            solution.solve(2.0),
            Err(SimulationError::OutOfRange { .. })
        ));
    }
}
