//! Integrator traits and types
//!
//! # Design Philosophy
//!
//! This module follows the same pattern as `PhysicalQuantity`:
//! - Central enum `IntegrationMethod` defines which numerical method runs
//!   and carries that method's parameters
//! - `Integrator` is the stable interface every method implements
//! - `DenseSolution` is what an integration hands back: a continuous
//!   trajectory that can be evaluated at any time inside its horizon
//!
//! The Phase Controller only ever sees `dyn Integrator`, so swapping the
//! method never touches the controller.

use crate::error::{SimResult, SimulationError};
use crate::physics::{PhysicalModel, StateVector};
use crate::solver::methods::{DormandPrince, RK4Integrator, Rosenbrock23};

// =================================================================================================
// Integration Method Enumeration
// =================================================================================================

/// Numerical method used to integrate each phase
///
/// Each variant carries the data specific to that method.
///
/// # Examples
///
/// ```rust
/// use ferm_rs::solver::IntegrationMethod;
///
/// // Adaptive Rosenbrock 2(3), the default
/// let adaptive = IntegrationMethod::default();
/// assert_eq!(adaptive.name(), "Rosenbrock");
///
/// // Fixed-step classical Runge-Kutta
/// let fixed = IntegrationMethod::RungeKutta4 { step: 0.01 };
/// assert!(fixed.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum IntegrationMethod {
    /// Adaptive, L-stable Rosenbrock 2(3) with dense output
    ///
    /// Handles the stiff substrate balance of small `Ks` at step sizes set
    /// by accuracy alone.
    ///
    /// # Parameters
    /// - `rtol`: Relative tolerance
    /// - `atol`: Absolute tolerance
    /// - `max_steps`: Safety limit on attempted steps per phase
    Rosenbrock {
        rtol: f64,
        atol: f64,
        max_steps: usize,
    },

    /// Adaptive Dormand-Prince 5(4) with dense output
    ///
    /// Explicit: with a small `Ks` the fed phase forces steps near the
    /// stability limit and the step budget can run out.
    ///
    /// # Parameters
    /// - `rtol`: Relative tolerance
    /// - `atol`: Absolute tolerance
    /// - `max_steps`: Safety limit on attempted steps per phase
    DormandPrince {
        rtol: f64,
        atol: f64,
        max_steps: usize,
    },

    /// Classical fourth-order Runge-Kutta at a fixed internal step
    ///
    /// # Parameters
    /// - `step`: Internal step size (h)
    RungeKutta4 {
        step: f64,
    },
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::Rosenbrock {
            rtol: 1e-8,
            atol: 1e-9,
            max_steps: 100_000,
        }
    }
}

impl IntegrationMethod {
    /// Dormand-Prince 5(4) with its default tolerances
    pub fn dormand_prince() -> Self {
        IntegrationMethod::DormandPrince {
            rtol: 1e-6,
            atol: 1e-8,
            max_steps: 100_000,
        }
    }
}

impl IntegrationMethod {
    /// Get name identifier
    pub fn name(&self) -> &str {
        match self {
            IntegrationMethod::Rosenbrock { .. } => "Rosenbrock",
            IntegrationMethod::DormandPrince { .. } => "DormandPrince",
            IntegrationMethod::RungeKutta4 { .. } => "RungeKutta4",
        }
    }

    /// Validate that parameters are numerically meaningful
    pub fn validate(&self) -> SimResult<()> {
        match self {
            IntegrationMethod::Rosenbrock { rtol, atol, max_steps }
            | IntegrationMethod::DormandPrince { rtol, atol, max_steps } => {
                if !(rtol.is_finite() && *rtol > 0.0) {
                    return Err(SimulationError::Configuration(
                        "Relative tolerance must be positive".to_string(),
                    ));
                }
                if !(atol.is_finite() && *atol > 0.0) {
                    return Err(SimulationError::Configuration(
                        "Absolute tolerance must be positive".to_string(),
                    ));
                }
                if *max_steps == 0 {
                    return Err(SimulationError::Configuration(
                        "Maximum steps must be greater than 0".to_string(),
                    ));
                }
                Ok(())
            }
            IntegrationMethod::RungeKutta4 { step } => {
                if !(step.is_finite() && *step > 0.0) {
                    return Err(SimulationError::Configuration(
                        "RK4 step must be positive".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Build the integrator for this method
    pub fn build(&self) -> Box<dyn Integrator> {
        match self {
            IntegrationMethod::Rosenbrock { rtol, atol, max_steps } => Box::new(
                Rosenbrock23::new()
                    .with_tolerances(*rtol, *atol)
                    .with_max_steps(*max_steps),
            ),
            IntegrationMethod::DormandPrince { rtol, atol, max_steps } => Box::new(
                DormandPrince::new()
                    .with_tolerances(*rtol, *atol)
                    .with_max_steps(*max_steps),
            ),
            IntegrationMethod::RungeKutta4 { step } => Box::new(RK4Integrator::new(*step)),
        }
    }
}

// =================================================================================================
// Integrator Trait
// =================================================================================================

/// Numerical integrator for dy/dt = f(t, y)
///
/// # Contract
///
/// `integrate` starts a solution at local time `t = 0` from `initial` and
/// returns a [`DenseSolution`] valid over `[0, horizon]`. Implementations
/// may integrate lazily; callers must not assume any work happens before the
/// first `solve`.
///
/// # Implementing a New Integrator
///
/// ```rust
/// use ferm_rs::error::SimResult;
/// use ferm_rs::physics::{PhysicalModel, StateVector};
/// use ferm_rs::solver::{DenseSolution, Integrator};
///
/// /// Holds the initial state forever (only useful in tests)
/// struct Frozen;
///
/// struct FrozenSolution(StateVector, f64);
///
/// impl DenseSolution for FrozenSolution {
///     fn solve(&mut self, _t: f64) -> SimResult<StateVector> { Ok(self.0) }
///     fn horizon(&self) -> f64 { self.1 }
///     fn steps(&self) -> usize { 0 }
/// }
///
/// impl Integrator for Frozen {
///     fn integrate<'a>(
///         &self,
///         _model: &'a dyn PhysicalModel,
///         initial: StateVector,
///         horizon: f64,
///     ) -> SimResult<Box<dyn DenseSolution + 'a>> {
///         Ok(Box::new(FrozenSolution(initial, horizon)))
///     }
///
///     fn name(&self) -> &str { "Frozen" }
/// }
/// ```
pub trait Integrator: Send + Sync {
    /// Start integrating `model` from `initial` over `[0, horizon]`
    ///
    /// # Errors
    ///
    /// `Configuration` for a non-positive horizon, `Numerical` for a
    /// non-finite initial state.
    fn integrate<'a>(
        &self,
        model: &'a dyn PhysicalModel,
        initial: StateVector,
        horizon: f64,
    ) -> SimResult<Box<dyn DenseSolution + 'a>>;

    /// Name of the method (used in metadata and logging)
    fn name(&self) -> &str;
}

/// Continuous trajectory produced by an [`Integrator`]
pub trait DenseSolution {
    /// State at local time `t`
    ///
    /// Integrates forward as far as needed; times already covered are
    /// interpolated without re-integrating.
    ///
    /// # Errors
    ///
    /// `OutOfRange` when `t` lies outside `[0, horizon]`; any error raised
    /// by the model or the step controller while advancing.
    fn solve(&mut self, t: f64) -> SimResult<StateVector>;

    /// Upper bound of the solution domain
    fn horizon(&self) -> f64;

    /// Number of accepted integration steps so far
    fn steps(&self) -> usize;
}

/// Common argument checks shared by every integrator
pub(crate) fn check_start(initial: &StateVector, horizon: f64) -> SimResult<()> {
    if !(horizon.is_finite() && horizon > 0.0) {
        return Err(SimulationError::Configuration(format!(
            "Integration horizon must be positive, got {}",
            horizon
        )));
    }
    initial.validate(0.0)
}

/// Range check for `DenseSolution::solve`
///
/// A relative slack of a few ulps absorbs rounding in `k · dt` sample times.
pub(crate) fn check_range(t: f64, horizon: f64) -> SimResult<()> {
    let slack = 1e-9 * horizon.max(1.0);
    if t.is_nan() || t < -slack || t > horizon + slack {
        return Err(SimulationError::OutOfRange { time: t, horizon });
    }
    Ok(())
}
