//! Monod growth kinetics for a stirred fermenter
//!
//! # Model equations
//!
//! Specific growth rate (Monod):
//!
//! $$\mu = \mu_{max} \cdot \frac{S}{S + K_s}$$
//!
//! Volumetric growth rate $r_X = \mu \cdot X$. With feed flow $F(t)$ from
//! [`FeedProfile`]:
//!
//! ```text
//! dX/dt = rX − X·F(t)/V
//! dS/dt = F(t)·(Sf − S)/V − rX/Yxs_abs
//! dV/dt = F(t)
//! ```
//!
//! In the batch phase F = 0 and the system reduces to closed-vessel growth.
//!
//! Uptake is evaluated at `max(S, 0)`: a substrate value that an integration
//! step pushes marginally below zero stops growth instead of flipping the sign
//! of µ (and, for `S → −Ks`, making it singular).
//!
//! # Jacobian
//!
//! With `D = F/V` and `µ' = umax·Ks/(S + Ks)²`:
//!
//! ```text
//!        │ µ − D      X·µ'              X·F/V²        │
//! ∂f/∂y = │ −µ/Yxs     −D − X·µ'/Yxs     −F·(Sf−S)/V²  │
//!        │ 0          0                 0             │
//! ```
//!
//! For small `Ks` the middle entry dominates every other rate in the system,
//! which makes the fed phase stiff once substrate is limiting.
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::models::{FermentationModel, Phase, SimulationParameters};
//! use ferm_rs::physics::PhysicalModel;
//!
//! let params = SimulationParameters::default();
//! let model = FermentationModel::new(params.kinetic_constants().unwrap(), Phase::Batch);
//!
//! let rate = model.compute_physics(0.0, &params.initial_state()).unwrap();
//! assert!(rate.biomass() > 0.0);
//! assert!(rate.substrate() < 0.0);
//! assert_eq!(rate.volume(), 0.0);
//! ```

use nalgebra::Matrix3;

use crate::error::SimResult;
use crate::models::{FeedProfile, KineticConstants, Phase};
use crate::physics::{PhysicalModel, StateVector};

/// Kinetic model for one process phase
///
/// Pure: the phase context is part of the value, so a new model is built at
/// every phase switch instead of mutating a shared one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FermentationModel {
    constants: KineticConstants,
    feed: FeedProfile,
    phase: Phase,
}

impl FermentationModel {
    /// Create the model for a phase
    pub fn new(constants: KineticConstants, phase: Phase) -> Self {
        Self {
            constants,
            feed: FeedProfile::new(constants),
            phase,
        }
    }

    /// Active phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Kinetic constants
    pub fn constants(&self) -> &KineticConstants {
        &self.constants
    }

    /// Monod specific growth rate µ(S) (1/h), zero for `S ≤ 0`
    #[inline]
    pub fn specific_growth_rate(&self, substrate: f64) -> f64 {
        let s = substrate.max(0.0);
        self.constants.max_growth_rate * s / (s + self.constants.half_saturation)
    }

    /// Slope dµ/dS (L·g⁻¹·h⁻¹)
    ///
    /// Below zero the slope at `S = 0` is kept, so the substrate balance
    /// stays stiff on both sides of exhaustion.
    #[inline]
    pub fn growth_rate_slope(&self, substrate: f64) -> f64 {
        let ks = self.constants.half_saturation;
        let s = substrate.max(0.0);
        self.constants.max_growth_rate * ks / ((s + ks) * (s + ks))
    }

    /// Feed flow at local phase time `t` (L/h)
    #[inline]
    pub fn feed_rate(&self, t: f64) -> f64 {
        self.feed.rate(self.phase, t)
    }
}

impl PhysicalModel for FermentationModel {
    fn compute_physics(&self, t: f64, state: &StateVector) -> SimResult<StateVector> {
        state.validate(t)?;

        let x = state.biomass();
        let s = state.substrate();
        let v = state.volume();

        let growth = self.specific_growth_rate(s) * x;
        let flow = self.feed_rate(t);

        // Batch phase: flow == 0, dilution and feed terms vanish
        let dilution = flow / v;

        Ok(StateVector::new(
            growth - x * dilution,
            dilution * (self.constants.feed_substrate - s) - growth / self.constants.absolute_yield,
            flow,
        ))
    }

    fn jacobian(&self, t: f64, state: &StateVector) -> SimResult<Matrix3<f64>> {
        state.validate(t)?;

        let x = state.biomass();
        let s = state.substrate();
        let v = state.volume();
        let absolute_yield = self.constants.absolute_yield;

        let mu = self.specific_growth_rate(s);
        let slope = self.growth_rate_slope(s);
        let dilution = self.feed_rate(t) / v;

        // ∂D/∂V = −F/V²
        let dilution_slope = -dilution / v;

        Ok(Matrix3::new(
            mu - dilution,
            x * slope,
            -x * dilution_slope,
            -mu / absolute_yield,
            -dilution - x * slope / absolute_yield,
            (self.constants.feed_substrate - s) * dilution_slope,
            0.0,
            0.0,
            0.0,
        ))
    }

    fn name(&self) -> &str {
        match self.phase {
            Phase::Batch => "Monod batch",
            Phase::Fed { .. } => "Monod fed-batch",
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
