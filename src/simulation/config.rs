//! Run configuration
//!
//! Sampling grid, event thresholds and integration method for one run. The
//! defaults reproduce the reference process: 0.1 h samples over a 1000 h
//! horizon per phase, a 0.001 g/L substrate-exhaustion threshold and a
//! stationary tail half as long as the batch phase.

use crate::error::{SimResult, SimulationError};
use crate::solver::IntegrationMethod;

/// Configuration of a simulation run
///
/// # Examples
///
/// ```rust
/// use ferm_rs::simulation::SimulationConfiguration;
/// use ferm_rs::solver::IntegrationMethod;
///
/// // Reference configuration
/// let config = SimulationConfiguration::default();
/// assert_eq!(config.samples_per_phase(), 10_000);
///
/// // Fixed-step RK4 on a coarser grid
/// let config = SimulationConfiguration::default()
///     .with_sample_interval(0.5)
///     .with_method(IntegrationMethod::RungeKutta4 { step: 0.01 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfiguration {
    /// Sampling interval dt (h)
    pub sample_interval: f64,

    /// Integration horizon of each phase (h)
    pub horizon: f64,

    /// Substrate concentration below which the batch phase ends (g/L)
    pub substrate_threshold: f64,

    /// Length of the stationary tail as a fraction of the batch duration
    pub padding_fraction: f64,

    /// Numerical method for every phase
    pub method: IntegrationMethod,
}

impl Default for SimulationConfiguration {
    fn default() -> Self {
        Self {
            sample_interval: 0.1,
            horizon: 1000.0,
            substrate_threshold: 0.001,
            padding_fraction: 0.5,
            method: IntegrationMethod::default(),
        }
    }
}

impl SimulationConfiguration {
    /// Create a configuration with a given method and default sampling
    pub fn new(method: IntegrationMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Set the sampling interval dt (h)
    pub fn with_sample_interval(mut self, sample_interval: f64) -> Self {
        self.sample_interval = sample_interval;
        self
    }

    /// Set the per-phase horizon (h)
    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the substrate-exhaustion threshold (g/L)
    pub fn with_substrate_threshold(mut self, substrate_threshold: f64) -> Self {
        self.substrate_threshold = substrate_threshold;
        self
    }

    /// Set the stationary tail length as a fraction of the batch duration
    pub fn with_padding_fraction(mut self, padding_fraction: f64) -> Self {
        self.padding_fraction = padding_fraction;
        self
    }

    /// Set the integration method
    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    /// Number of sampling intervals per phase (N = horizon / dt)
    ///
    /// Samples are taken at `k · dt` for `k = 0..=N`.
    pub fn samples_per_phase(&self) -> usize {
        (self.horizon / self.sample_interval + 1e-9).floor() as usize
    }

    /// Validate configuration
    pub fn validate(&self) -> SimResult<()> {
        if !(self.sample_interval.is_finite() && self.sample_interval > 0.0) {
            return Err(SimulationError::Configuration(format!(
                "Sample interval must be positive, got {}",
                self.sample_interval
            )));
        }

        if !(self.horizon.is_finite() && self.horizon >= self.sample_interval) {
            return Err(SimulationError::Configuration(format!(
                "Horizon must cover at least one sample interval, got {}",
                self.horizon
            )));
        }

        if !(self.substrate_threshold.is_finite() && self.substrate_threshold >= 0.0) {
            return Err(SimulationError::Configuration(format!(
                "Substrate threshold must be non-negative, got {}",
                self.substrate_threshold
            )));
        }

        if !(self.padding_fraction.is_finite() && self.padding_fraction >= 0.0) {
            return Err(SimulationError::Configuration(format!(
                "Padding fraction must be non-negative, got {}",
                self.padding_fraction
            )));
        }

        self.method.validate()
    }
}
