//! # motion-core
//!
//! Motion planning and step-pulse generation for multi-axis stepper
//! machines (3D printers, CNC routers, pick-and-place heads).
//!
//! ## Features
//!
//! - **Look-ahead planner**: trapezoidal velocity profiles with junction
//!   deviation cornering across a fixed-capacity block queue
//! - **Interrupt-safe pulse engine**: integer-only per-tick math, Bresenham
//!   multi-axis step distribution, pulse-accurate position tracking
//! - **Kinematics**: Cartesian, CoreXY, CoreXZ and linear delta transforms
//!   behind one trait
//! - **embedded-hal 1.0**: `OutputPin` step/dir adapter, `InputPin`
//!   endstops, `DelayNs` pulse widths
//! - **no_std compatible**: the whole core runs without the standard
//!   library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use motion_core::{Cartesian, CartesianPosition, MotionController};
//!
//! // Load machine limits from TOML
//! let limits = motion_core::load_limits("machine.toml")?;
//!
//! let kinematics = Cartesian::new(&limits);
//! let mut controller = MotionController::<_>::new(kinematics, limits, TIMER_HZ)?;
//!
//! // Plan moves from the main loop
//! controller.request_linear_move(&CartesianPosition::new(10.0, 0.0, 0.0, 0.0), 50.0)?;
//!
//! // Drive the engine from the step timer
//! let ticks_until_next = controller.tick(&mut step_pins, &mut endstops);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod config;
pub mod controller;
pub mod endstop;
pub mod error;
pub mod kinematics;
pub mod planner;
pub mod stepper;

mod profile;

// Re-exports for ergonomic API
pub use config::{validate_limits, KinematicsConfig, MachineLimits, TravelRange};
pub use controller::MotionController;
pub use endstop::{AbortFlag, AbortReason, EndstopMonitor, EndstopPin, NoEndstops, PinEndstops};
pub use error::{ConfigError, Error, KinematicsError, PlanError, Result};
pub use kinematics::{
    ActuatorSteps, Axis, Cartesian, CartesianPosition, CoreXy, CoreXz, Delta,
    KinematicsTransform, AXIS_COUNT,
};
pub use planner::{BlockQueue, MotionBlock, MotionPlanner, BLOCK_QUEUE_SIZE};
pub use stepper::{AxisPins, EngineState, StepDirPins, StepOutput, StepTimer, StepperPulseEngine};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_limits, parse_limits};

// Unit types
pub use config::units::{Millimeters, MmPerSec, MmPerSecSquared, StepRate, UnitExt};
