//! Whole-run properties of `simulate`
//!
//! Determinism, physical sanity of the series, the analytic limit of the
//! kinetics, error reporting and agreement between integrators.

use ferm_rs::simulation::{simulate_many, simulate_with, PhaseOutcome, SimulationConfiguration};
use ferm_rs::solver::IntegrationMethod;
use ferm_rs::{simulate, SimulationParameters};

mod common;
use common::{
    fast_configuration, mass_balance_bound, reference_parameters, relative_error, samples_before,
};

#[test]
fn test_simulation_is_deterministic() {
    let params = reference_parameters();

    let first = simulate(&params);
    let second = simulate(&params);

    assert_eq!(first, second);
}

#[test]
fn test_canonical_scenario() {
    let result = simulate(&reference_parameters());

    assert!(result.is_ok(), "{:?}", result.error);
    assert!(result.batch_duration > 0.0);
    assert!(result.feed_duration > 0.0);
    assert!(result.final_cell_conc > 0.0);

    // F0 ≈ 2.58 L/h, usp = 0.0625 1/h: 500 L are fed in about 41 h
    assert!(
        result.feed_duration > 38.0 && result.feed_duration < 44.0,
        "feed duration {} h",
        result.feed_duration
    );
}

#[test]
fn test_biomass_is_monotone_during_batch() {
    let result = simulate(&reference_parameters());
    let batch = samples_before(&result.biomass, result.batch_duration);

    assert!(batch.len() > 100);
    for pair in batch.windows(2) {
        assert!(pair[1].1 >= pair[0].1, "biomass decreased at t = {}", pair[1].0);
    }
}

#[test]
fn test_substrate_is_consumed_during_batch() {
    let params = reference_parameters();
    let result = simulate(&params);
    let batch = samples_before(&result.substrate, result.batch_duration);

    assert_eq!(batch[0], (0.0, params.initial_substrate));
    for pair in batch.windows(2) {
        assert!(pair[1].1 <= pair[0].1);
    }
}

#[test]
fn test_first_sample_is_initial_state() {
    let params = reference_parameters();
    let result = simulate(&params);

    assert_eq!(result.biomass.first(), Some((0.0, params.initial_biomass())));
    assert_eq!(result.volume.first(), Some((0.0, params.initial_volume)));
}

#[test]
fn test_vanishing_half_saturation_gives_exponential_growth() {
    // Ks → 0: µ = umax while substrate lasts, X(t) = X0·exp(umax·t)
    let params = reference_parameters().with_half_saturation(1e-9);

    let result = simulate(&params);
    assert!(result.is_ok(), "{:?}", result.error);
    assert!(result.batch_phase.is_completed());
    assert!(result.fed_phase.is_completed());

    // Mid-batch: S(10 h) ≈ 18 g/L, far from exhaustion
    assert!(result.batch_duration > 10.0);
    assert!(result.substrate.value_at(10.0).unwrap() > 15.0);

    let x10 = result.biomass.value_at(10.0).unwrap();
    let expected = params.initial_biomass() * (params.max_growth_rate * 10.0).exp();

    assert!(
        relative_error(x10, expected) < 0.01,
        "X(10) = {}, expected {}",
        x10,
        expected
    );
}

/// Full run with a small half-saturation constant
///
/// Substrate is limiting for the whole fed phase, so it stays near zero and
/// the final biomass sits just below the mass-balance bound.
fn assert_stiff_run_is_sane(half_saturation: f64) {
    let params = reference_parameters().with_half_saturation(half_saturation);
    let result = simulate(&params);

    assert!(result.is_ok(), "Ks = {}: {:?}", half_saturation, result.error);
    assert!(result.batch_phase.is_completed());
    assert!(
        result.fed_phase.is_completed(),
        "Ks = {}: fed phase {}",
        half_saturation,
        result.fed_phase
    );
    assert!(
        result.feed_duration > 38.0 && result.feed_duration < 44.0,
        "Ks = {}: feed duration {} h",
        half_saturation,
        result.feed_duration
    );

    let bound = mass_balance_bound(&params);
    assert!(
        result.final_cell_conc <= bound && result.final_cell_conc > 0.97 * bound,
        "Ks = {}: final biomass {} g/L, bound {} g/L",
        half_saturation,
        result.final_cell_conc,
        bound
    );

    let lowest = result.substrate.values().fold(f64::INFINITY, f64::min);
    assert!(lowest >= -1e-6, "Ks = {}: substrate reached {}", half_saturation, lowest);
}

#[test]
fn test_realistic_small_half_saturation_completes() {
    for half_saturation in [1e-3, 1e-4] {
        assert_stiff_run_is_sane(half_saturation);
    }
}

#[test]
fn test_vanishing_half_saturation_respects_mass_balance() {
    for half_saturation in [1e-5, 1e-9] {
        assert_stiff_run_is_sane(half_saturation);
    }
}

#[test]
fn test_reference_run_respects_mass_balance() {
    let params = reference_parameters();
    let result = simulate(&params);

    assert!(result.final_cell_conc < mass_balance_bound(&params));
}

#[test]
fn test_singular_yield_is_reported() {
    // Yxs_max · ms == umax makes Yxs_abs infinite
    let params = reference_parameters().with_max_yield(0.5).with_maintenance(0.5);

    let result = simulate(&params);

    let error = result.error().expect("an error should be reported");
    assert!(!error.is_empty());
    assert!(error.contains("absolute yield"));
    assert_eq!(result.batch_phase, PhaseOutcome::Failed);
    assert!(result.biomass.is_empty());
}

#[test]
fn test_negative_yield_runs_out_the_batch_horizon() {
    // Yxs_max · ms > umax: Yxs_abs = −0.5, growth releases substrate
    let params = reference_parameters().with_max_yield(0.5).with_maintenance(1.0);
    let config = fast_configuration().with_horizon(50.0);

    let result = simulate_with(&params, &config);

    assert!(result.is_ok(), "{:?}", result.error);
    assert_eq!(result.batch_phase, PhaseOutcome::HorizonExhausted);
    assert_eq!(result.fed_phase, PhaseOutcome::Skipped);
    assert_eq!(result.batch_duration, 0.0);
    assert_eq!(result.final_cell_conc, 0.0);

    // Every batch sample, no tail
    assert_eq!(result.biomass.len(), config.samples_per_phase() + 1);
    let (_, last_substrate) = result.substrate.last().unwrap();
    assert!(last_substrate > params.initial_substrate);
}

#[test]
fn test_zero_yield_is_a_numerical_error() {
    let params = reference_parameters().with_max_yield(0.0);

    let result = simulate(&params);

    assert_eq!(result.batch_phase, PhaseOutcome::Failed);
    assert!(result.error().unwrap().contains("non-finite"));
}

#[test]
fn test_numerical_failure_keeps_partial_series() {
    // V0 = 0 makes the dilution term 0/0 from the first step
    let params = SimulationParameters {
        initial_volume: 0.0,
        ..reference_parameters()
    };

    let result = simulate_with(&params, &fast_configuration());

    assert!(!result.is_ok());
    assert_eq!(result.batch_phase, PhaseOutcome::Failed);
    assert_eq!(result.fed_phase, PhaseOutcome::Skipped);
    assert_eq!(result.biomass.points, vec![(0.0, params.initial_biomass())]);
    assert!(result.error().unwrap().contains("non-finite"));
}

#[test]
fn test_default_matches_tight_dormand_prince() {
    let params = reference_parameters();

    let default = simulate(&params);
    let reference = simulate_with(
        &params,
        &SimulationConfiguration::new(IntegrationMethod::DormandPrince {
            rtol: 1e-10,
            atol: 1e-12,
            max_steps: 1_000_000,
        }),
    );
    assert!(reference.is_ok(), "{:?}", reference.error);

    assert!((default.batch_duration - reference.batch_duration).abs() <= 0.1 + 1e-9);
    assert!(relative_error(default.final_cell_conc, reference.final_cell_conc) < 1e-4);

    // Sample by sample over the shared batch grid
    let end = default.batch_duration.min(reference.batch_duration);
    let ours = samples_before(&default.biomass, end);
    let theirs = samples_before(&reference.biomass, end);
    assert_eq!(ours.len(), theirs.len());

    for (&(t, a), &(_, b)) in ours.iter().zip(&theirs) {
        assert!(relative_error(a, b) < 1e-4, "At t={}: {} vs {}", t, a, b);
    }
}

#[test]
fn test_default_and_rk4_agree() {
    let params = reference_parameters();

    let adaptive = simulate(&params);
    let fixed = simulate_with(
        &params,
        &SimulationConfiguration::new(IntegrationMethod::RungeKutta4 { step: 0.01 }),
    );

    assert!(fixed.is_ok(), "{:?}", fixed.error);

    // Events can move by at most one sample
    assert!((adaptive.batch_duration - fixed.batch_duration).abs() <= 0.1 + 1e-9);
    assert!((adaptive.feed_duration - fixed.feed_duration).abs() <= 0.2 + 1e-9);
    assert!(relative_error(fixed.final_cell_conc, adaptive.final_cell_conc) < 0.01);
}

#[test]
fn test_simulate_many() {
    let params: Vec<_> = [15.0, 25.0, 35.0]
        .iter()
        .map(|&z| reference_parameters().with_growth_rate_scaling(z))
        .collect();

    let results = simulate_many(&params, &fast_configuration());

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_ok()));

    // Faster feed reaches the target volume sooner
    assert!(results[0].feed_duration > results[1].feed_duration);
    assert!(results[1].feed_duration > results[2].feed_duration);

    // The batch phase does not depend on the setpoint
    assert!(results.iter().all(|r| r.batch_duration == results[0].batch_duration));
}
