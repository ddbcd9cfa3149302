//! Numerical methods for integrating the kinetic models
//!
//! This module contains concrete implementations of the
//! [`Integrator`](crate::solver::Integrator) trait.
//!
//! # Architecture
//!
//! The separation between the abstract interface (`solver::traits`) and the
//! concrete implementations (`solver::methods`) means a new method is added
//! here without touching the phase controller.
//!
//! # Available Methods
//!
//! - **[`Rosenbrock23`]**: Adaptive Rosenbrock 2(3), L-stable
//!   - Order: Second-order with embedded third-order error estimate
//!   - Cost: 3 function evaluations, 1 Jacobian and one 3×3 inverse per step
//!   - Dense output: native second-order interpolant
//!   - Use: **Default**; stays cheap when a small `Ks` makes the fed phase stiff
//!
//! - **[`DormandPrince`]**: Adaptive Dormand-Prince 5(4)
//!   - Order: Fifth-order with embedded fourth-order error estimate
//!   - Cost: 6 function evaluations per accepted step (FSAL)
//!   - Dense output: native fourth-order continuous extension
//!   - Use: Non-stiff parameter sets (`Ks` comparable to the sampled substrate)
//!
//! - **[`RK4Integrator`]**: Classical fourth-order Runge-Kutta
//!   - Order: Fourth-order O(h⁴)
//!   - Cost: 4 function evaluations per step
//!   - Dense output: cubic Hermite between grid points
//!   - Use: Cross-checking the adaptive method on a fixed grid
//!
//! All return lazily advanced solutions: nothing beyond the last requested
//! time is ever integrated.
//!
//! # Future Methods (Planned)
//!
//! - **BDF**: Multistep alternative to the Rosenbrock pair for tighter
//!   tolerances

mod dopri5;
mod rk4;
mod rosenbrock;

// Re-exports for convenience
pub use dopri5::{DormandPrince, DormandPrinceSolution};
pub use rk4::RK4Integrator;
pub use rosenbrock::{Rosenbrock23, Rosenbrock23Solution};
