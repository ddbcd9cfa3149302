//! Kinetic models for fermentation simulation
//!
//! All models implement the [`PhysicalModel`](crate::physics::PhysicalModel) trait.
//! The integrator calls `compute_physics` at each stage; models are responsible
//! for the kinetics (growth, uptake, feed), the integrator for the time stepping.
//!
//! # Contents
//!
//! ## [`SimulationParameters`]: the input record
//!
//! Canonical-unit process parameters plus the derived quantities
//! (`usp`, `Yxs_abs`, `X0`, `Vfinal`).
//!
//! ## [`Phase`] and [`FeedProfile`]: the feed-rate function
//!
//! Zero flow in batch, exponentially increasing flow in fed-batch.
//!
//! ## [`FermentationModel`]: Monod kinetics
//!
//! Biomass, substrate and volume balances for one phase.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod feed;
pub mod monod;
pub mod parameters;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use feed::{FeedProfile, Phase};
pub use monod::FermentationModel;
pub use parameters::{KineticConstants, SimulationParameters};
