//! Mock models for testing
//!
//! These models have known analytical solutions, making them
//! ideal for validating integrator accuracy.

use ferm_rs::error::SimResult;
use ferm_rs::physics::{PhysicalModel, StateVector};

// =================================================================================================
// Exponential Decay: dy/dt = -k*y
// =================================================================================================

/// Exponential decay on every component: dy/dt = -k*y
///
/// Analytical solution: y(t) = y₀ * exp(-k*t)
pub struct ExponentialDecay {
    pub decay_rate: f64,
}

impl ExponentialDecay {
    pub fn new(decay_rate: f64) -> Self {
        Self { decay_rate }
    }

    /// Compute analytical solution at time t
    pub fn analytical_solution(&self, t: f64, y0: f64) -> f64 {
        y0 * (-self.decay_rate * t).exp()
    }
}

impl PhysicalModel for ExponentialDecay {
    fn compute_physics(&self, t: f64, state: &StateVector) -> SimResult<StateVector> {
        state.validate(t)?;
        Ok(*state * -self.decay_rate)
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

// =================================================================================================
// Logistic Growth: dX/dt = r*X*(1 - X/K)
// =================================================================================================

/// Logistic growth on the biomass component, other components frozen
///
/// Analytical solution: X(t) = K / (1 + (K/X₀ - 1) * exp(-r*t))
pub struct LogisticGrowth {
    pub rate: f64,
    pub capacity: f64,
}

impl LogisticGrowth {
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self { rate, capacity }
    }

    /// Compute analytical solution at time t
    pub fn analytical_solution(&self, t: f64, x0: f64) -> f64 {
        self.capacity / (1.0 + (self.capacity / x0 - 1.0) * (-self.rate * t).exp())
    }
}

impl PhysicalModel for LogisticGrowth {
    fn compute_physics(&self, t: f64, state: &StateVector) -> SimResult<StateVector> {
        state.validate(t)?;
        let x = state.biomass();
        Ok(StateVector::new(self.rate * x * (1.0 - x / self.capacity), 0.0, 0.0))
    }

    fn name(&self) -> &str {
        "Logistic Growth"
    }
}
