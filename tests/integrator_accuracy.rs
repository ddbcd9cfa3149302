//! Accuracy and convergence tests for the integrators
//!
//! These tests verify that both methods reproduce closed-form solutions and
//! exhibit the expected convergence when refining step size or tolerance.

use ferm_rs::error::SimulationError;
use ferm_rs::models::{FermentationModel, Phase};
use ferm_rs::physics::{PhysicalModel, StateVector};
use ferm_rs::solver::{DormandPrince, IntegrationMethod, Integrator, RK4Integrator, Rosenbrock23};

mod common;
use common::{reference_parameters, relative_error, ExponentialDecay, LogisticGrowth};

fn final_biomass(
    integrator: &dyn Integrator,
    model: &dyn PhysicalModel,
    x0: f64,
    horizon: f64,
) -> f64 {
    let mut solution = integrator
        .integrate(model, StateVector::new(x0, 0.0, 0.0), horizon)
        .unwrap();
    solution.solve(horizon).unwrap().biomass()
}

#[test]
fn test_dormand_prince_dense_output_matches_exponential_decay() {
    let model = ExponentialDecay::new(0.3);
    let mut solution = DormandPrince::new()
        .integrate(&model, StateVector::new(1.0, 1.0, 1.0), 20.0)
        .unwrap();

    // Sample on the controller's 0.1 grid
    for k in 0..=200 {
        let t = k as f64 * 0.1;
        let numerical = solution.solve(t).unwrap().biomass();
        let analytical = model.analytical_solution(t, 1.0);

        assert!(
            relative_error(numerical, analytical) < 1e-4,
            "At t={}: {} vs {}",
            t,
            numerical,
            analytical
        );
    }
}

#[test]
fn test_dormand_prince_logistic_growth() {
    let model = LogisticGrowth::new(0.25, 10.0);
    let mut solution = DormandPrince::new()
        .integrate(&model, StateVector::new(0.082, 0.0, 0.0), 60.0)
        .unwrap();

    for t in [0.0, 5.0, 17.3, 20.0, 33.33, 60.0] {
        let numerical = solution.solve(t).unwrap().biomass();
        let analytical = model.analytical_solution(t, 0.082);

        assert!(
            relative_error(numerical, analytical) < 1e-4,
            "At t={}: {} vs {}",
            t,
            numerical,
            analytical
        );
    }
}

#[test]
fn test_dormand_prince_tolerance_convergence() {
    let model = LogisticGrowth::new(0.25, 10.0);
    let exact = model.analytical_solution(30.0, 0.082);

    let loose = DormandPrince::new().with_tolerances(1e-4, 1e-6);
    let tight = DormandPrince::new().with_tolerances(1e-9, 1e-11);

    let loose_error = relative_error(final_biomass(&loose, &model, 0.082, 30.0), exact);
    let tight_error = relative_error(final_biomass(&tight, &model, 0.082, 30.0), exact);

    assert!(tight_error < loose_error);
    assert!(tight_error < 1e-7, "tight error {}", tight_error);
}

#[test]
fn test_rosenbrock_logistic_growth() {
    let model = LogisticGrowth::new(0.25, 10.0);
    let mut solution = Rosenbrock23::new()
        .integrate(&model, StateVector::new(0.082, 0.0, 0.0), 60.0)
        .unwrap();

    for t in [0.0, 5.0, 17.3, 20.0, 33.33, 60.0] {
        let numerical = solution.solve(t).unwrap().biomass();
        let analytical = model.analytical_solution(t, 0.082);

        assert!(
            relative_error(numerical, analytical) < 1e-4,
            "At t={}: {} vs {}",
            t,
            numerical,
            analytical
        );
    }
}

#[test]
fn test_rosenbrock_tolerance_convergence() {
    let model = LogisticGrowth::new(0.25, 10.0);
    let exact = model.analytical_solution(30.0, 0.082);

    let loose = Rosenbrock23::new().with_tolerances(1e-4, 1e-6);
    let tight = Rosenbrock23::new().with_tolerances(1e-9, 1e-11);

    let loose_error = relative_error(final_biomass(&loose, &model, 0.082, 30.0), exact);
    let tight_error = relative_error(final_biomass(&tight, &model, 0.082, 30.0), exact);

    assert!(tight_error < loose_error);
    assert!(tight_error < 1e-5, "tight error {}", tight_error);
}

#[test]
fn test_stiff_fed_phase_needs_implicit_method() {
    // Ks = 1e-4: the substrate balance relaxes at ~1e5 1/h
    let params = reference_parameters().with_half_saturation(1e-4);
    let model = FermentationModel::new(
        params.kinetic_constants().unwrap(),
        Phase::Fed { transition_biomass: 10.0 },
    );
    let initial = StateVector::new(10.0, 5e-4, params.initial_volume);

    let mut stiff = Rosenbrock23::new().integrate(&model, initial, 1000.0).unwrap();
    let state = stiff.solve(30.0).unwrap();
    assert!(stiff.steps() < 5_000, "{} steps", stiff.steps());

    // V(t) = V0 + F0/usp · (exp(usp·t) − 1)
    let usp = params.setpoint_growth_rate();
    let expected_volume =
        params.initial_volume + model.feed_rate(0.0) / usp * ((usp * 30.0).exp() - 1.0);
    assert!(relative_error(state.volume(), expected_volume) < 1e-4);
    assert!(state.substrate() > -1e-6 && state.substrate() < 1e-3);

    // The explicit pair is held at its stability limit
    let mut explicit = DormandPrince::new()
        .with_max_steps(5_000)
        .integrate(&model, initial, 1000.0)
        .unwrap();
    assert!(matches!(
        explicit.solve(30.0),
        Err(SimulationError::MaxStepsExceeded { .. })
    ));
}

#[test]
fn test_rk4_fourth_order_convergence() {
    // RK4 should have fourth-order convergence: error ~ O(h⁴)
    // When h → h/2, error should → error/16

    // Negative decay rate: exponential growth at 0.5 1/h
    let model = ExponentialDecay::new(-0.5);
    let exact = model.analytical_solution(4.0, 0.1);

    let errors: Vec<f64> = [0.4, 0.2, 0.1]
        .iter()
        .map(|&h| (final_biomass(&RK4Integrator::new(h), &model, 0.1, 4.0) - exact).abs())
        .collect();

    for i in 0..errors.len() - 1 {
        let ratio = errors[i] / errors[i + 1];
        println!("RK4 convergence ratio {}->{}: {}", i, i + 1, ratio);

        assert!(
            ratio > 12.0 && ratio < 20.0,
            "Convergence ratio {} not fourth-order",
            ratio
        );
    }
}

#[test]
fn test_methods_agree_through_trait_objects() {
    let model = LogisticGrowth::new(0.25, 10.0);

    let adaptive = IntegrationMethod::default().build();
    let fixed = IntegrationMethod::RungeKutta4 { step: 0.01 }.build();

    let a = final_biomass(adaptive.as_ref(), &model, 0.082, 40.0);
    let b = final_biomass(fixed.as_ref(), &model, 0.082, 40.0);

    assert!(relative_error(a, b) < 1e-5);
}

#[test]
fn test_rk4_interpolation_between_grid_points() {
    let model = ExponentialDecay::new(0.5);
    let mut solution = RK4Integrator::new(0.05)
        .integrate(&model, StateVector::new(2.0, 2.0, 2.0), 10.0)
        .unwrap();

    // Mid-step times fall on the Hermite interpolant
    for t in [0.025, 1.2345, 4.999, 9.975] {
        let numerical = solution.solve(t).unwrap().substrate();
        let analytical = model.analytical_solution(t, 2.0);

        assert!(relative_error(numerical, analytical) < 1e-5);
    }
}
