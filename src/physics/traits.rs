//! Physical models traits and types
//!
//! This module defines the core API for physical models:
//! - `PhysicalModel`: trait for all kinetic models (right-hand side and
//!   its Jacobian)
//! - `StateVector`: the (biomass, substrate, volume) state triple
//! - `PhysicalQuantity`: type-safe identifiers for the state components

use nalgebra::{Matrix3, Vector3};
use std::fmt;

use crate::error::{SimResult, SimulationError};

// =================================================================================================
// Physical quantities (Type-safe Identifiers)
// =================================================================================================

/// Components of the fermentation state
///
/// The discriminant order is the storage order inside [`StateVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalQuantity {
    /// Biomass concentration X (g/L)
    Biomass,

    /// Substrate concentration S (g/L)
    Substrate,

    /// Broth volume V (L)
    Volume,
}

impl PhysicalQuantity {
    /// All quantities in storage order
    pub const ALL: [PhysicalQuantity; 3] = [
        PhysicalQuantity::Biomass,
        PhysicalQuantity::Substrate,
        PhysicalQuantity::Volume,
    ];

    /// Index of this quantity inside a [`StateVector`]
    pub fn index(self) -> usize {
        match self {
            PhysicalQuantity::Biomass => 0,
            PhysicalQuantity::Substrate => 1,
            PhysicalQuantity::Volume => 2,
        }
    }

    /// Lower-case name used in series labels and error messages
    pub fn name(self) -> &'static str {
        match self {
            PhysicalQuantity::Biomass => "biomass",
            PhysicalQuantity::Substrate => "substrate",
            PhysicalQuantity::Volume => "volume",
        }
    }

    /// Canonical unit
    pub fn unit(self) -> &'static str {
        match self {
            PhysicalQuantity::Biomass | PhysicalQuantity::Substrate => "g/L",
            PhysicalQuantity::Volume => "L",
        }
    }
}

impl fmt::Display for PhysicalQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =================================================================================================
// State Vector
// =================================================================================================

/// State of the fermenter at one instant
///
/// Ordered triple (X, S, V): biomass concentration (g/L), substrate
/// concentration (g/L) and broth volume (L). Backed by a stack-allocated
/// `Vector3` so the integrators can do stage arithmetic without allocating.
///
/// # Example
/// ```
/// use ferm_rs::physics::{StateVector, PhysicalQuantity};
///
/// let state = StateVector::new(0.082, 20.0, 1000.0);
/// assert_eq!(state.get(PhysicalQuantity::Substrate), 20.0);
/// assert!(state.validate(0.0).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    values: Vector3<f64>,
}

impl StateVector {
    /// Create a state from its three components
    pub fn new(biomass: f64, substrate: f64, volume: f64) -> Self {
        Self { values: Vector3::new(biomass, substrate, volume) }
    }

    /// All-zero state (used as a derivative accumulator)
    pub fn zeros() -> Self {
        Self { values: Vector3::zeros() }
    }

    /// Wrap a raw vector
    pub fn from_vector(values: Vector3<f64>) -> Self {
        Self { values }
    }

    /// Underlying vector
    pub fn as_vector(&self) -> &Vector3<f64> {
        &self.values
    }

    /// Biomass concentration X (g/L)
    pub fn biomass(&self) -> f64 {
        self.values[0]
    }

    /// Substrate concentration S (g/L)
    pub fn substrate(&self) -> f64 {
        self.values[1]
    }

    /// Broth volume V (L)
    pub fn volume(&self) -> f64 {
        self.values[2]
    }

    /// Get a component by quantity
    pub fn get(&self, quantity: PhysicalQuantity) -> f64 {
        self.values[quantity.index()]
    }

    /// Set a component by quantity
    pub fn set(&mut self, quantity: PhysicalQuantity, value: f64) {
        self.values[quantity.index()] = value;
    }

    /// First component that is NaN or infinite, if any
    pub fn first_non_finite(&self) -> Option<PhysicalQuantity> {
        PhysicalQuantity::ALL
            .into_iter()
            .find(|quantity| !self.get(*quantity).is_finite())
    }

    /// Check every component is finite
    ///
    /// `time` is only used to label the error.
    pub fn validate(&self, time: f64) -> SimResult<()> {
        match self.first_non_finite() {
            Some(quantity) => Err(SimulationError::Numerical { quantity, time }),
            None => Ok(()),
        }
    }
}

impl From<Vector3<f64>> for StateVector {
    fn from(values: Vector3<f64>) -> Self {
        Self::from_vector(values)
    }
}

// Operator overloading for numerical operations

impl std::ops::Add for StateVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self { values: self.values + rhs.values }
    }
}

impl std::ops::Mul<f64> for StateVector {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self { values: self.values * scalar }
    }
}

// =================================================================================================
// Physical Model Trait
// =================================================================================================

/// Trait for kinetic models
///
/// # Responsibility
/// Computes the right-hand side f(t, y) of dy/dt = f(t, y).
/// Does NOT integrate it (that's the Integrator's job).
///
/// Implementations must be pure: the same `(t, state)` always yields the
/// same derivative. Any phase-dependent context lives in the model value
/// itself, never in captured mutable state.
pub trait PhysicalModel: Send + Sync {
    /// Computes dState/dt at time `t` (local to the current phase)
    ///
    /// # Errors
    /// `SimulationError::Numerical` when `state` holds a non-finite component.
    fn compute_physics(&self, t: f64, state: &StateVector) -> SimResult<StateVector>;

    /// Jacobian ∂f/∂y at `(t, state)`
    ///
    /// Row `i` holds the partial derivatives of component `i` of the
    /// derivative, in [`PhysicalQuantity`] storage order. Used by the
    /// linearly implicit integrators.
    ///
    /// The default is a forward-difference approximation with a step of
    /// `√ε · max(|yⱼ|, 1)` per column. Models with a closed form should
    /// override it.
    fn jacobian(&self, t: f64, state: &StateVector) -> SimResult<Matrix3<f64>> {
        let base = *self.compute_physics(t, state)?.as_vector();
        let mut jacobian = Matrix3::zeros();

        for j in 0..3 {
            let mut perturbed = *state.as_vector();
            let step = f64::EPSILON.sqrt() * perturbed[j].abs().max(1.0);
            perturbed[j] += step;

            let shifted = self.compute_physics(t, &StateVector::from_vector(perturbed))?;
            jacobian.set_column(j, &((shifted.as_vector() - base) / step));
        }

        Ok(jacobian)
    }

    /// Name of the model (used to display and logging)
    fn name(&self) -> &str;
}
