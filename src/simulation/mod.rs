//! Running fermentation simulations
//!
//! # Entry points
//!
//! - [`simulate`]: one run with the reference configuration
//! - [`simulate_with`]: one run with an explicit [`SimulationConfiguration`]
//! - [`simulate_many`]: independent runs over several parameter sets
//!   (parallel with the `parallel` feature)
//!
//! None of them return `Result`: failures are reported in
//! [`SimulationResult::error`] alongside the samples recorded before the
//! failure.
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::simulation::{simulate_with, SimulationConfiguration};
//! use ferm_rs::SimulationParameters;
//!
//! let params = SimulationParameters::default();
//! let config = SimulationConfiguration::default().with_sample_interval(0.5);
//!
//! let result = simulate_with(&params, &config);
//!
//! assert!(result.is_ok());
//! assert!(result.batch_duration > 0.0);
//! assert!(result.feed_duration > 0.0);
//! ```

mod config;
mod controller;
mod result;

pub use config::SimulationConfiguration;
pub use controller::PhaseController;
pub use result::{PhaseMetrics, PhaseOutcome, SeriesRecorder, SimulationResult, TimeSeries};

use crate::models::SimulationParameters;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Simulate one run with the default configuration
///
/// # Example
///
/// ```rust
/// use ferm_rs::{simulate, SimulationParameters};
///
/// let result = simulate(&SimulationParameters::default());
///
/// assert!(result.is_ok());
/// assert!(result.final_cell_conc > 0.0);
/// ```
pub fn simulate(params: &SimulationParameters) -> SimulationResult {
    simulate_with(params, &SimulationConfiguration::default())
}

/// Simulate one run with an explicit configuration
pub fn simulate_with(
    params: &SimulationParameters,
    config: &SimulationConfiguration,
) -> SimulationResult {
    let result = PhaseController::new(params, config).run();

    match result.error() {
        Some(error) => log::warn!(
            "Simulation failed after {} samples: {}",
            result.len(),
            error
        ),
        None => log::info!(
            "Simulation finished: batch {} h, feed {} h, final biomass {} g/L",
            result.batch_duration,
            result.feed_duration,
            result.final_cell_conc
        ),
    }

    result
}

/// Simulate several independent parameter sets
///
/// Results are returned in the order of `params`. With the `parallel`
/// feature the runs are distributed over the Rayon thread pool.
pub fn simulate_many(
    params: &[SimulationParameters],
    config: &SimulationConfiguration,
) -> Vec<SimulationResult> {
    #[cfg(feature = "parallel")]
    {
        params.par_iter().map(|p| simulate_with(p, config)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        params.iter().map(|p| simulate_with(p, config)).collect()
    }
}
