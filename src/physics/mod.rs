//! Physical models
//!
//! This module provides the trait and the state types shared by every
//! kinetic model and every integrator.
//!
//! # Core Concepts
//!
//! - **Physical Model**: Computes dState/dt at a given time and state
//! - **State Vector**: The (biomass, substrate, volume) triple
//! - **Physical Quantity**: Type-safe identifier for a state component
//!
//! # Architecture
//!
//! Physical models are **separate from numerical integrators**:
//! - The model provides the **equations** (kinetics)
//! - The integrator provides the **method** to solve them (numerics)
//!
//! This separation allows:
//! - Same model with different integrators (Rosenbrock, Dormand-Prince, RK4)
//! - Same integrator with different models (batch kinetics, fed-batch kinetics)
//!
//! # Example
//!
//! ```rust
//! use ferm_rs::error::SimResult;
//! use ferm_rs::physics::{PhysicalModel, StateVector};
//!
//! struct Decay;
//!
//! impl PhysicalModel for Decay {
//!     fn compute_physics(&self, _t: f64, state: &StateVector) -> SimResult<StateVector> {
//!         Ok(*state * -1.0)
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Decay"
//!     }
//! }
//!
//! let rate = Decay.compute_physics(0.0, &StateVector::new(1.0, 1.0, 1.0)).unwrap();
//! assert_eq!(rate.biomass(), -1.0);
//! ```

// module declaration
pub mod traits;

// re-export commonly used types for convenience
pub use traits::{PhysicalModel, PhysicalQuantity, StateVector};
