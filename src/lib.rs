//! ferm-rs: Fed-batch fermentation simulator
//!
//! Simulates microbial growth in a stirred fermenter under Monod kinetics:
//! a batch phase that ends when the substrate is exhausted, an optional fed
//! phase with an exponentially increasing feed that ends when the target
//! volume is reached, and a stationary tail for display.
//!
//! # Architecture
//!
//! ferm-rs is built on two core principles:
//!
//! 1. **Separation of Physics and Numerics**
//!    - Kinetic models define equations (what to integrate)
//!    - Integrators provide methods (how to integrate)
//!
//! 2. **Errors as values**
//!    - Every internal operation returns [`SimResult`](error::SimResult)
//!    - The entry points never fail: errors land in
//!      [`SimulationResult::error`] next to the partial series
//!
//! # Quick Start
//!
//! ```rust
//! use ferm_rs::{simulate, SimulationParameters};
//!
//! // 1. Process parameters (canonical units: L, g/L, 1/h)
//! let params = SimulationParameters::default();
//!
//! // 2. Run
//! let result = simulate(&params);
//!
//! // 3. Access results
//! assert!(result.is_ok());
//! println!("Batch phase: {:.1} h", result.batch_duration);
//! println!("Feed phase: {:.1} h", result.feed_duration);
//! println!("Final biomass: {:.1} g/L", result.final_cell_conc);
//! println!("Samples: {}", result.biomass.len());
//! ```
//!
//! # Modules
//!
//! - [`physics`]: State vector and the model trait
//! - [`models`]: Parameters, feed profile and Monod kinetics
//! - [`solver`]: Numerical integrators with dense output
//! - [`simulation`]: Phase controller, configuration and results
//! - [`error`]: Error type
//!
//! # Features
//!
//! - `parallel`: run [`simulate_many`](simulation::simulate_many) over the
//!   Rayon thread pool

// Core modules
pub mod error;
pub mod physics;

pub mod models;
pub mod simulation;
pub mod solver;

pub use models::SimulationParameters;
pub use simulation::{simulate, SimulationResult};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use ferm_rs::prelude::*;
    //!
    //! let result = simulate_with(
    //!     &SimulationParameters::default(),
    //!     &SimulationConfiguration::default(),
    //! );
    //! assert!(result.is_ok());
    //! ```
    pub use crate::error::{SimResult, SimulationError};
    pub use crate::models::{FermentationModel, Phase, SimulationParameters};
    pub use crate::physics::{PhysicalModel, PhysicalQuantity, StateVector};
    pub use crate::simulation::{
        simulate, simulate_many, simulate_with, PhaseOutcome, SimulationConfiguration,
        SimulationResult, TimeSeries,
    };
    pub use crate::solver::{
        DenseSolution, DormandPrince, IntegrationMethod, Integrator, RK4Integrator, Rosenbrock23,
    };
}
