//! Process parameters of a fed-batch fermentation
//!
//! [`SimulationParameters`] is the immutable input record handed over by the
//! form/unit-conversion layer. Every value is already in canonical units and
//! already range-checked: this crate never rescales or clamps it.
//!
//! [`KineticConstants`] is the subset the kinetic model needs at every
//! derivative evaluation, with the derived quantities computed once.
//!
//! # Derived quantities
//!
//! | Symbol    | Formula                                   | Method                   |
//! |-----------|-------------------------------------------|--------------------------|
//! | `usp`     | `umax · z / 100`                          | `setpoint_growth_rate()` |
//! | `Yxs_abs` | `Yxs_max · umax / (umax − Yxs_max · ms)`  | `absolute_yield()`       |
//! | `X0`      | `OD0 · YDCW_OD`                           | `initial_biomass()`      |
//! | `Vfinal`  | `V0 + Vfeed`                              | `final_volume()`         |
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::models::SimulationParameters;
//!
//! let params = SimulationParameters::default();
//! assert!((params.initial_biomass() - 0.082).abs() < 1e-12);
//! assert_eq!(params.final_volume(), 1500.0);
//! assert!(params.feeding_enabled());
//! ```

use crate::error::{SimResult, SimulationError};
use crate::physics::StateVector;

// =================================================================================================
// SimulationParameters
// =================================================================================================

/// Input record of one simulation run
///
/// | Field                 | Symbol     | Unit                    |
/// |-----------------------|------------|-------------------------|
/// | `initial_volume`      | `V0`       | L                       |
/// | `feed_volume`         | `Vfeed`    | L                       |
/// | `initial_od`          | `OD0`      | OD                      |
/// | `max_growth_rate`     | `umax`     | 1/h                     |
/// | `initial_substrate`   | `S0`       | g/L                     |
/// | `feed_substrate`      | `Sf`       | g/L                     |
/// | `growth_rate_scaling` | `z`        | %                       |
/// | `maintenance`         | `ms`       | g S · g DCW⁻¹ · h⁻¹     |
/// | `half_saturation`     | `Ks`       | g/L                     |
/// | `dcw_per_od`          | `YDCW_OD`  | g DCW / OD              |
/// | `max_yield`           | `Yxs_max`  | g DCW / g S             |
/// | `feeding`             | `isFeeding`| -                       |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    pub initial_volume: f64,
    pub feed_volume: f64,
    pub initial_od: f64,
    pub max_growth_rate: f64,
    pub initial_substrate: f64,
    pub feed_substrate: f64,
    pub growth_rate_scaling: f64,
    pub maintenance: f64,
    pub half_saturation: f64,
    pub dcw_per_od: f64,
    pub max_yield: f64,
    pub feeding: bool,
}

impl Default for SimulationParameters {
    /// Reference E. coli-like fed-batch on glucose
    fn default() -> Self {
        Self {
            initial_volume: 1000.0,
            feed_volume: 500.0,
            initial_od: 0.2,
            max_growth_rate: 0.25,
            initial_substrate: 20.0,
            feed_substrate: 500.0,
            growth_rate_scaling: 25.0,
            maintenance: 0.0031,
            half_saturation: 0.1823,
            dcw_per_od: 0.41,
            max_yield: 0.49,
            feeding: true,
        }
    }
}

impl SimulationParameters {
    /// Enable or disable the fed-batch phase
    pub fn with_feeding(mut self, feeding: bool) -> Self {
        self.feeding = feeding;
        self
    }

    /// Set the feed volume Vfeed (L)
    pub fn with_feed_volume(mut self, feed_volume: f64) -> Self {
        self.feed_volume = feed_volume;
        self
    }

    /// Set the Monod half-saturation constant Ks (g/L)
    pub fn with_half_saturation(mut self, half_saturation: f64) -> Self {
        self.half_saturation = half_saturation;
        self
    }

    /// Set the maintenance coefficient ms
    pub fn with_maintenance(mut self, maintenance: f64) -> Self {
        self.maintenance = maintenance;
        self
    }

    /// Set the growth-rate scaling z (%)
    pub fn with_growth_rate_scaling(mut self, growth_rate_scaling: f64) -> Self {
        self.growth_rate_scaling = growth_rate_scaling;
        self
    }

    /// Set the maximum yield Yxs_max
    pub fn with_max_yield(mut self, max_yield: f64) -> Self {
        self.max_yield = max_yield;
        self
    }

    /// Set the initial substrate concentration S0 (g/L)
    pub fn with_initial_substrate(mut self, initial_substrate: f64) -> Self {
        self.initial_substrate = initial_substrate;
        self
    }

    /// Fed-phase specific growth-rate setpoint `usp = umax · z / 100` (1/h)
    pub fn setpoint_growth_rate(&self) -> f64 {
        self.max_growth_rate * self.growth_rate_scaling / 100.0
    }

    /// Maintenance-corrected yield `Yxs_abs` (g DCW / g S)
    ///
    /// Not finite when `umax == Yxs_max · ms`.
    pub fn absolute_yield(&self) -> f64 {
        self.max_yield * self.max_growth_rate
            / (self.max_growth_rate - self.max_yield * self.maintenance)
    }

    /// Initial biomass concentration `X0 = OD0 · YDCW_OD` (g/L)
    pub fn initial_biomass(&self) -> f64 {
        self.initial_od * self.dcw_per_od
    }

    /// Target volume `Vfinal = V0 + Vfeed` (L)
    pub fn final_volume(&self) -> f64 {
        self.initial_volume + self.feed_volume
    }

    /// True when the fed-batch phase runs after the batch phase
    pub fn feeding_enabled(&self) -> bool {
        self.feeding && self.feed_volume > 0.0
    }

    /// Batch-phase initial state `(X0, S0, V0)`
    pub fn initial_state(&self) -> StateVector {
        StateVector::new(
            self.initial_biomass(),
            self.initial_substrate,
            self.initial_volume,
        )
    }

    /// Derive the constants used by the kinetic model
    ///
    /// # Errors
    ///
    /// `SimulationError::Configuration` when `Yxs_abs` is not finite
    /// (`umax == Yxs_max · ms`). An infinite yield would not make the
    /// derivatives NaN, it would silently stop substrate uptake, so it is
    /// rejected before integration starts.
    ///
    /// A finite negative yield (`Yxs_max · ms > umax`) is passed through:
    /// substrate then accumulates and the batch phase runs out its horizon.
    /// A zero yield surfaces as a `Numerical` error on the first evaluation.
    pub fn kinetic_constants(&self) -> SimResult<KineticConstants> {
        let absolute_yield = self.absolute_yield();

        if !absolute_yield.is_finite() {
            return Err(SimulationError::Configuration(format!(
                "absolute yield Yxs_abs = {} is not finite \
                 (umax = {}, Yxs_max · ms = {})",
                absolute_yield,
                self.max_growth_rate,
                self.max_yield * self.maintenance
            )));
        }

        Ok(KineticConstants {
            max_growth_rate: self.max_growth_rate,
            half_saturation: self.half_saturation,
            absolute_yield,
            feed_substrate: self.feed_substrate,
            initial_volume: self.initial_volume,
            setpoint_growth_rate: self.setpoint_growth_rate(),
            maintenance: self.maintenance,
        })
    }
}

// =================================================================================================
// KineticConstants
// =================================================================================================

/// Constants closed over by the kinetic model and the feed-rate function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KineticConstants {
    /// umax (1/h)
    pub max_growth_rate: f64,
    /// Ks (g/L)
    pub half_saturation: f64,
    /// Yxs_abs (g DCW / g S)
    pub absolute_yield: f64,
    /// Sf (g/L)
    pub feed_substrate: f64,
    /// V0 (L)
    pub initial_volume: f64,
    /// usp (1/h)
    pub setpoint_growth_rate: f64,
    /// ms (g S · g DCW⁻¹ · h⁻¹)
    pub maintenance: f64,
}

// =================================================================================================
// Tests
// =================================================================================================
