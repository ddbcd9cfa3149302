//! Numerical integrators
//!
//! This module provides the traits and implementations used to integrate the
//! kinetic models of [`crate::models`] over one process phase.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Model** (`PhysicalModel`) - WHAT to integrate
//!    - The right-hand side f(t, y) for one phase
//!
//! 2. **Method** (`IntegrationMethod`) - HOW to integrate
//!    - Method selection and its numerical parameters
//!
//! 3. **Integrator** (`Integrator` trait) - The numerical method
//!    - Produces a [`DenseSolution`] the caller samples at its own times
//!    - Independent of the kinetics
//!
//! # Module Organization
//!
//! - **`traits`**: `IntegrationMethod`, `Integrator`, `DenseSolution`
//! - **`methods`**: `Rosenbrock23`, `DormandPrince`, `RK4Integrator`
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌──────────────────┐      ┌────────────────────┐
//! │ PhysicalModel    │      │ IntegrationMethod  │ ← HOW
//! │ (one phase)      │      └─────────┬──────────┘
//! └────────┬─────────┘                │ build()
//!          │                 ┌────────▼──────────┐
//!          └────────────────►│ Integrator        │
//!                            └────────┬──────────┘
//!                                     │ integrate(model, y0, horizon)
//!                            ┌────────▼──────────┐
//!                            │ DenseSolution     │ ← solve(t) on demand
//!                            └───────────────────┘
//! ```
//!
//! # Quick Start Example
//!
//! ```rust
//! use ferm_rs::models::{FermentationModel, Phase, SimulationParameters};
//! use ferm_rs::solver::IntegrationMethod;
//!
//! let params = SimulationParameters::default();
//! let model = FermentationModel::new(params.kinetic_constants().unwrap(), Phase::Batch);
//!
//! let integrator = IntegrationMethod::default().build();
//! let mut solution = integrator
//!     .integrate(&model, params.initial_state(), 1000.0)
//!     .unwrap();
//!
//! // Samples are requested in increasing time; integration follows lazily
//! for k in 0..=10 {
//!     let state = solution.solve(k as f64 * 0.1).unwrap();
//!     assert!(state.biomass() > 0.0);
//! }
//! ```
//!
//! # Error Handling
//!
//! Every operation returns [`SimResult`](crate::error::SimResult). Common
//! errors:
//! - Invalid method parameters (non-positive tolerance or step)
//! - Numerical failure (non-finite state)
//! - Step size underflow or step budget exhausted

// =================================================================================================
// Module Declarations
// =================================================================================================

mod traits;
pub mod methods;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{DenseSolution, IntegrationMethod, Integrator};

pub use methods::{
    DormandPrince, DormandPrinceSolution, RK4Integrator, Rosenbrock23, Rosenbrock23Solution,
};
