//! Error taxonomy of the simulation core
//!
//! Every fallible operation in the crate returns [`SimResult<T>`].
//! Errors never cross [`crate::simulate`]: the
//! entry point converts them into the `error` string of the returned
//! [`crate::SimulationResult`].

use crate::physics::PhysicalQuantity;

/// Errors raised while building or running a simulation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// A state component became NaN or infinite
    #[error("numerical error: {quantity} became non-finite at t = {time} h")]
    Numerical {
        quantity: PhysicalQuantity,
        time: f64,
    },

    /// Parameters or configuration make the problem ill-defined
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Adaptive step size collapsed below the representable minimum
    #[error("step size too small at t = {time} h")]
    StepSizeTooSmall { time: f64 },

    /// Adaptive integrator ran out of steps before reaching the requested time
    #[error("exceeded {steps} integration steps at t = {time} h")]
    MaxStepsExceeded { steps: usize, time: f64 },

    /// Dense solution queried outside the integrated domain
    #[error("t = {time} h is outside the solution domain [0, {horizon}] h")]
    OutOfRange { time: f64, horizon: f64 },
}

/// Result alias used across the crate.
pub type SimResult<T> = Result<T, SimulationError>;
