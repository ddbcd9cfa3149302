//! Helper functions for integration tests

use ferm_rs::simulation::{SimulationConfiguration, TimeSeries};
use ferm_rs::SimulationParameters;

/// Reference process (V0 = 1000 L, Vfeed = 500 L, umax = 0.25 1/h, ...)
pub fn reference_parameters() -> SimulationParameters {
    SimulationParameters::default()
}

/// Default configuration on a coarser 0.5 h sampling grid
pub fn fast_configuration() -> SimulationConfiguration {
    SimulationConfiguration::default().with_sample_interval(0.5)
}

/// Upper bound on the biomass concentration at the end of the fed phase
///
/// From `d(XV)/dt = µXV` and `d(SV)/dt = F·Sf − µXV/Yxs_abs` with `S ≥ 0`:
/// `X·V ≤ X0·V0 + Yxs_abs·(S0·V0 + Sf·(V − V0))`, evaluated for a volume
/// one percent above the target to cover the overshoot of the last sample.
pub fn mass_balance_bound(params: &SimulationParameters) -> f64 {
    let volume = 1.01 * params.final_volume();
    let supplied = params.initial_substrate * params.initial_volume
        + params.feed_substrate * (volume - params.initial_volume);

    (params.initial_biomass() * params.initial_volume + params.absolute_yield() * supplied) / volume
}

/// Samples of a series strictly before `time`
pub fn samples_before(series: &TimeSeries, time: f64) -> Vec<(f64, f64)> {
    series.iter().copied().filter(|&(t, _)| t < time).collect()
}

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error() {
        assert!((relative_error(1.0, 1.0) - 0.0).abs() < 1e-10);
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-10);
        assert!((relative_error(0.9, 1.0) - 0.1).abs() < 1e-10);
    }
}
