//! Process phases and the exponential feed profile
//!
//! # Phases
//!
//! A run starts in [`Phase::Batch`] (constant volume, no feed). When the
//! substrate is exhausted and feeding is enabled, it switches once, and only
//! once, to [`Phase::Fed`], which carries the biomass concentration captured
//! at the switch.
//!
//! # Feed law
//!
//! The fed phase uses an exponentially increasing feed designed to hold the
//! specific growth rate at the setpoint `usp`:
//!
//! ```text
//! F0   = (usp / Yxs_abs + ms) · (X_b · V0 / Sf)
//! F(t) = F0 · exp(usp · t)          t measured from the start of the fed phase
//! ```
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::models::{FeedProfile, Phase, SimulationParameters};
//!
//! let constants = SimulationParameters::default().kinetic_constants().unwrap();
//! let feed = FeedProfile::new(constants);
//!
//! assert_eq!(feed.rate(Phase::Batch, 5.0), 0.0);
//!
//! let fed = Phase::Fed { transition_biomass: 10.0 };
//! assert!(feed.rate(fed, 1.0) > feed.rate(fed, 0.0));
//! ```

use crate::models::KineticConstants;

// =================================================================================================
// Phase
// =================================================================================================

/// Active process phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Growth at constant volume, no feed
    Batch,

    /// Growth with exponential feed
    Fed {
        /// Biomass concentration X_b captured at the Batch → Fed switch (g/L)
        transition_biomass: f64,
    },
}

impl Phase {
    /// Name used in logs and metadata
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Batch => "batch",
            Phase::Fed { .. } => "fed-batch",
        }
    }
}

// =================================================================================================
// Feed Profile
// =================================================================================================

/// Volumetric feed flow F(t) (L/h)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedProfile {
    constants: KineticConstants,
}

impl FeedProfile {
    /// Create the feed profile for a set of kinetic constants
    pub fn new(constants: KineticConstants) -> Self {
        Self { constants }
    }

    /// Initial feed rate F0 for a given transition biomass (L/h)
    pub fn initial_rate(&self, transition_biomass: f64) -> f64 {
        let k = &self.constants;
        (k.setpoint_growth_rate / k.absolute_yield + k.maintenance)
            * (transition_biomass * k.initial_volume / k.feed_substrate)
    }

    /// Feed rate at local phase time `t` (L/h)
    ///
    /// Identically zero in the batch phase.
    pub fn rate(&self, phase: Phase, t: f64) -> f64 {
        match phase {
            Phase::Batch => 0.0,
            Phase::Fed { transition_biomass } => {
                self.initial_rate(transition_biomass)
                    * (self.constants.setpoint_growth_rate * t).exp()
            }
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
