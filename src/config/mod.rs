//! Configuration module for motion-core.
//!
//! Provides the [`MachineLimits`] struct the core is initialized with, unit
//! types, validation, and TOML loading (with the `std` feature).

mod machine;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use machine::{KinematicsConfig, MachineLimits, TravelRange};
pub use validation::validate_limits;

#[cfg(feature = "std")]
pub use loader::{load_limits, parse_limits};

// Re-export unit types at config level
pub use units::{Millimeters, MmPerSec, MmPerSecSquared, StepRate};
