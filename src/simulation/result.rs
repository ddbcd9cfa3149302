//! Simulation results
//!
//! [`SeriesRecorder`] collects the sampled series while the phase controller
//! runs; [`SimulationResult::assemble`] packages them with the summary
//! metrics, the per-phase outcomes and the run metadata.

use std::collections::HashMap;
use std::fmt;

use crate::physics::{PhysicalQuantity, StateVector};

// =================================================================================================
// Time Series
// =================================================================================================

/// Ordered `(t, value)` samples of one quantity
///
/// Times are in hours, in recording order. They are strictly increasing
/// except when the fed phase exhausts its horizon: the stationary tail then
/// starts from the batch end and revisits times already covered by fed
/// samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Quantity sampled (gives name and unit)
    pub quantity: PhysicalQuantity,

    /// `(time, value)` pairs
    pub points: Vec<(f64, f64)>,
}

impl TimeSeries {
    /// Create an empty series
    pub fn new(quantity: PhysicalQuantity) -> Self {
        Self {
            quantity,
            points: Vec::new(),
        }
    }

    /// Append a sample
    pub fn push(&mut self, time: f64, value: f64) {
        self.points.push((time, value));
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no samples
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sample times
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(t, _)| t)
    }

    /// Sample values
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(_, v)| v)
    }

    /// First sample
    pub fn first(&self) -> Option<(f64, f64)> {
        self.points.first().copied()
    }

    /// Last sample
    pub fn last(&self) -> Option<(f64, f64)> {
        self.points.last().copied()
    }

    /// Iterate over `(time, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.points.iter()
    }

    /// Value of the last sample at or before `time`
    pub fn value_at(&self, time: f64) -> Option<f64> {
        let index = self.points.partition_point(|&(t, _)| t <= time);
        index.checked_sub(1).map(|i| self.points[i].1)
    }
}

// =================================================================================================
// Series Recorder
// =================================================================================================

/// Collects biomass, substrate and volume samples during a run
///
/// Volume is only recorded when `record_volume` is set (feeding enabled).
#[derive(Debug, Clone)]
pub struct SeriesRecorder {
    biomass: TimeSeries,
    substrate: TimeSeries,
    volume: TimeSeries,
    record_volume: bool,
}

impl SeriesRecorder {
    /// Create an empty recorder
    pub fn new(record_volume: bool) -> Self {
        Self {
            biomass: TimeSeries::new(PhysicalQuantity::Biomass),
            substrate: TimeSeries::new(PhysicalQuantity::Substrate),
            volume: TimeSeries::new(PhysicalQuantity::Volume),
            record_volume,
        }
    }

    /// Record an integrated state at global time `time`
    pub fn record(&mut self, time: f64, state: &StateVector) {
        self.biomass.push(time, state.biomass());
        self.substrate.push(time, state.substrate());
        if self.record_volume {
            self.volume.push(time, state.volume());
        }
    }

    /// Record a stationary-phase sample: constant biomass, no substrate
    pub fn record_stationary(&mut self, time: f64, biomass: f64, volume: f64) {
        self.biomass.push(time, biomass);
        self.substrate.push(time, 0.0);
        if self.record_volume {
            self.volume.push(time, volume);
        }
    }

    /// Number of recorded time points
    pub fn len(&self) -> usize {
        self.biomass.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.biomass.is_empty()
    }
}

// =================================================================================================
// Phase Outcome
// =================================================================================================

/// How a process phase ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseOutcome {
    /// The phase event fired at global time `end` (h)
    Completed { end: f64 },

    /// The event never fired within the horizon
    HorizonExhausted,

    /// The phase did not run
    Skipped,

    /// The phase stopped on an error
    Failed,
}

impl PhaseOutcome {
    /// Check if the phase event fired
    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseOutcome::Completed { .. })
    }
}

impl fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseOutcome::Completed { end } => write!(f, "completed at {} h", end),
            PhaseOutcome::HorizonExhausted => write!(f, "horizon exhausted"),
            PhaseOutcome::Skipped => write!(f, "skipped"),
            PhaseOutcome::Failed => write!(f, "failed"),
        }
    }
}

// =================================================================================================
// Phase Metrics
// =================================================================================================

/// Event times and captured biomass of a run
///
/// All fields start at zero; the controller only overwrites them when the
/// corresponding event fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseMetrics {
    /// End of the batch phase, tf0 (h)
    pub batch_end: f64,

    /// End of the fed phase, tf1 (h)
    pub feed_end: f64,

    /// Biomass captured at the last phase event (g/L)
    pub cell_conc: f64,

    pub batch_phase: PhaseOutcome,
    pub fed_phase: PhaseOutcome,
}

impl Default for PhaseMetrics {
    fn default() -> Self {
        Self {
            batch_end: 0.0,
            feed_end: 0.0,
            cell_conc: 0.0,
            batch_phase: PhaseOutcome::Skipped,
            fed_phase: PhaseOutcome::Skipped,
        }
    }
}

// =================================================================================================
// Simulation Result
// =================================================================================================

/// Outcome of one fermentation run
///
/// A failed run still carries the series recorded before the failure; check
/// [`error`](SimulationResult::error) before trusting the metrics.
///
/// # Example
///
/// ```rust
/// use ferm_rs::{simulate, SimulationParameters};
///
/// let result = simulate(&SimulationParameters::default().with_feeding(false));
///
/// assert!(result.is_ok());
/// assert!(result.volume.is_empty());
/// assert_eq!(result.feed_duration, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Biomass concentration X (g/L)
    pub biomass: TimeSeries,

    /// Substrate concentration S (g/L)
    pub substrate: TimeSeries,

    /// Broth volume V (L), empty unless feeding is enabled
    pub volume: TimeSeries,

    /// Batch phase duration, tf0 (h)
    pub batch_duration: f64,

    /// Fed phase duration, tf1 − tf0 (h)
    pub feed_duration: f64,

    /// Biomass at the last phase event (g/L)
    pub final_cell_conc: f64,

    pub batch_phase: PhaseOutcome,
    pub fed_phase: PhaseOutcome,

    /// Error message, `None` on success
    pub error: Option<String>,

    /// Run metadata (integrator, sampling, step counts)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    /// Package recorded series and metrics
    pub fn assemble(
        recorder: SeriesRecorder,
        metrics: &PhaseMetrics,
        error: Option<String>,
    ) -> Self {
        Self {
            biomass: recorder.biomass,
            substrate: recorder.substrate,
            volume: recorder.volume,
            batch_duration: metrics.batch_end,
            feed_duration: metrics.feed_end - metrics.batch_end,
            final_cell_conc: metrics.cell_conc,
            batch_phase: metrics.batch_phase,
            fed_phase: metrics.fed_phase,
            error,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata entry
    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Check if the run finished without error
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Error message, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of time points in the series
    pub fn len(&self) -> usize {
        self.biomass.len()
    }

    /// Check if no time point was recorded
    pub fn is_empty(&self) -> bool {
        self.biomass.is_empty()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
