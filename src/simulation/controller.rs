//! Phase controller
//!
//! Drives one run through its phases and samples the integrated trajectory
//! on a fixed grid.
//!
//! # State machine
//!
//! ```text
//!                 S < threshold, feeding
//!   ┌───────┐ ───────────────────────────► ┌─────┐  V > Vfinal
//!   │ Batch │                              │ Fed │ ─────────────┐
//!   └───┬───┘ ─────────────┐               └──┬──┘              │
//!       │   S < threshold, │                  │ horizon         │
//!       │   no feeding     │                  │ exhausted       │
//!       │ horizon          ▼                  ▼                 ▼
//!       │ exhausted   ┌────────────────────────────────────────────┐
//!       └────────────►│ StationaryPad                              │──► Done
//!                     └────────────────────────────────────────────┘
//! ```
//!
//! # Sampling rules
//!
//! - Sample `k` of a phase is taken at local time `k · dt`, `k = 0..=N`.
//! - Each phase event is tested **before** the sample is recorded: the
//!   sample that fires an event is never part of the series.
//! - Fed-phase samples are placed at global time `local + tf0 + dt`.
//! - The stationary tail runs from `tEnd + dt` to `tEnd + fraction · tf0`
//!   with biomass frozen at the last captured value and no substrate.
//!
//! The tail is display-only: it does not change any metric.

use crate::error::{SimResult, SimulationError};
use crate::models::{FermentationModel, KineticConstants, Phase, SimulationParameters};
use crate::physics::StateVector;
use crate::simulation::{
    PhaseMetrics, PhaseOutcome, SeriesRecorder, SimulationConfiguration, SimulationResult,
};
use crate::solver::Integrator;

/// Controller state between phases
#[derive(Debug, Clone, Copy, PartialEq)]
enum ControllerState {
    Batch,
    Fed {
        handoff: StateVector,
        batch_end: f64,
    },
    StationaryPad {
        t_end: f64,
    },
    Done,
}

/// Runs one simulation through Batch, Fed and the stationary tail
///
/// A controller is consumed by [`run`](PhaseController::run); build a new one
/// per run.
pub struct PhaseController<'p> {
    params: &'p SimulationParameters,
    config: &'p SimulationConfiguration,
    integrator: Box<dyn Integrator>,

    recorder: SeriesRecorder,
    metrics: PhaseMetrics,
    integration_steps: usize,
}

impl<'p> PhaseController<'p> {
    /// Create a controller for one parameter set
    pub fn new(params: &'p SimulationParameters, config: &'p SimulationConfiguration) -> Self {
        Self {
            params,
            config,
            integrator: config.method.build(),
            recorder: SeriesRecorder::new(params.feeding_enabled()),
            metrics: PhaseMetrics::default(),
            integration_steps: 0,
        }
    }

    /// Run every phase and assemble the result
    ///
    /// Never fails: any error stops the run and is reported through
    /// [`SimulationResult::error`] together with the samples recorded so far.
    pub fn run(mut self) -> SimulationResult {
        let constants = match self.preflight() {
            Ok(constants) => constants,
            Err(error) => {
                self.metrics.batch_phase = PhaseOutcome::Failed;
                return self.finish(Some(error));
            }
        };

        let mut state = ControllerState::Batch;

        let error = loop {
            let next = match state {
                ControllerState::Batch => self.run_batch(&constants),
                ControllerState::Fed { handoff, batch_end } => {
                    self.run_fed(&constants, handoff, batch_end)
                }
                ControllerState::StationaryPad { t_end } => {
                    self.pad(t_end);
                    Ok(ControllerState::Done)
                }
                ControllerState::Done => break None,
            };

            match next {
                Ok(next) => state = next,
                Err(error) => {
                    match state {
                        ControllerState::Batch => {
                            self.metrics.batch_phase = PhaseOutcome::Failed;
                        }
                        ControllerState::Fed { .. } => {
                            self.metrics.fed_phase = PhaseOutcome::Failed;
                        }
                        _ => {}
                    }
                    break Some(error);
                }
            }
        };

        self.finish(error)
    }

    fn preflight(&self) -> SimResult<KineticConstants> {
        self.config.validate()?;
        self.params.kinetic_constants()
    }

    // =============================================================================================
    // Phases
    // =============================================================================================

    fn run_batch(&mut self, constants: &KineticConstants) -> SimResult<ControllerState> {
        let model = FermentationModel::new(*constants, Phase::Batch);
        let mut solution =
            self.integrator
                .integrate(&model, self.params.initial_state(), self.config.horizon)?;

        let dt = self.config.sample_interval;
        let mut exhaustion = None;

        for k in 0..=self.config.samples_per_phase() {
            let t = k as f64 * dt;
            let state = solution.solve(t)?;

            if state.substrate() < self.config.substrate_threshold {
                exhaustion = Some((t, state));
                break;
            }
            self.recorder.record(t, &state);
        }
        self.integration_steps += solution.steps();

        let Some((t, state)) = exhaustion else {
            log::debug!(
                "Substrate never fell below {} g/L within {} h",
                self.config.substrate_threshold,
                self.config.horizon
            );
            self.metrics.batch_phase = PhaseOutcome::HorizonExhausted;
            return Ok(ControllerState::StationaryPad { t_end: self.metrics.feed_end });
        };

        log::debug!("Batch phase ended at {} h (X = {} g/L)", t, state.biomass());

        self.metrics.batch_end = t;
        self.metrics.feed_end = t;
        self.metrics.cell_conc = state.biomass();
        self.metrics.batch_phase = PhaseOutcome::Completed { end: t };

        if self.params.feeding_enabled() {
            Ok(ControllerState::Fed { handoff: state, batch_end: t })
        } else {
            Ok(ControllerState::StationaryPad { t_end: t })
        }
    }

    fn run_fed(
        &mut self,
        constants: &KineticConstants,
        handoff: StateVector,
        batch_end: f64,
    ) -> SimResult<ControllerState> {
        let model = FermentationModel::new(
            *constants,
            Phase::Fed { transition_biomass: handoff.biomass() },
        );
        let mut solution = self.integrator.integrate(&model, handoff, self.config.horizon)?;

        log::debug!(
            "Fed phase started with F0 = {} L/h",
            model.feed_rate(0.0)
        );

        let dt = self.config.sample_interval;
        let final_volume = self.params.final_volume();
        let mut target = None;

        for k in 0..=self.config.samples_per_phase() {
            let local = k as f64 * dt;
            let t = local + batch_end + dt;
            let state = solution.solve(local)?;

            if state.volume() > final_volume {
                target = Some((t, state));
                break;
            }
            self.recorder.record(t, &state);
        }
        self.integration_steps += solution.steps();

        let Some((t, state)) = target else {
            // tf1 keeps its batch-end value: the run reports a zero feed duration
            log::debug!(
                "Volume never exceeded {} L within {} h",
                final_volume,
                self.config.horizon
            );
            self.metrics.fed_phase = PhaseOutcome::HorizonExhausted;
            return Ok(ControllerState::StationaryPad { t_end: self.metrics.feed_end });
        };

        log::debug!("Fed phase ended at {} h (X = {} g/L)", t, state.biomass());

        self.metrics.feed_end = t;
        self.metrics.cell_conc = state.biomass();
        self.metrics.fed_phase = PhaseOutcome::Completed { end: t };

        Ok(ControllerState::StationaryPad { t_end: t })
    }

    fn pad(&mut self, t_end: f64) {
        let dt = self.config.sample_interval;
        let duration = self.config.padding_fraction * self.metrics.batch_end;
        let count = (duration / dt + 1e-9).floor() as usize;

        for k in 1..=count {
            self.recorder.record_stationary(
                t_end + k as f64 * dt,
                self.metrics.cell_conc,
                self.params.final_volume(),
            );
        }
    }

    // =============================================================================================
    // Result
    // =============================================================================================

    fn finish(self, error: Option<SimulationError>) -> SimulationResult {
        let samples = self.recorder.len();
        let mut result =
            SimulationResult::assemble(self.recorder, &self.metrics, error.map(|e| e.to_string()));

        result.add_metadata("integrator", self.integrator.name());
        result.add_metadata("method", self.config.method.name());
        result.add_metadata("dt", &self.config.sample_interval.to_string());
        result.add_metadata("horizon", &self.config.horizon.to_string());
        result.add_metadata("samples", &samples.to_string());
        result.add_metadata("integration steps", &self.integration_steps.to_string());
        result.add_metadata("batch phase", &self.metrics.batch_phase.to_string());
        result.add_metadata("fed phase", &self.metrics.fed_phase.to_string());

        result
    }
}

// =================================================================================================
// Tests
// =================================================================================================
