//! Common utilities for integration tests

pub mod mock_models;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_models::{ExponentialDecay, LogisticGrowth};
pub use test_helpers::{
    fast_configuration,
    mass_balance_bound,
    reference_parameters,
    relative_error,
    samples_before,
};
