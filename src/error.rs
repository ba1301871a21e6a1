//! Error types for motion-core.
//!
//! Provides unified error handling across configuration, kinematics, and
//! motion planning. Runtime aborts are not errors; see
//! [`AbortReason`](crate::endstop::AbortReason).

use core::fmt;

use crate::kinematics::Axis;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all motion-core operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Kinematic transform error
    Kinematics(KinematicsError),
    /// Motion planning error
    Plan(PlanError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Steps-per-millimeter must be > 0
    InvalidStepsPerMm {
        /// Axis with the invalid value
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Max feedrate must be > 0
    InvalidMaxFeedrate {
        /// Axis with the invalid value
        axis: Axis,
        /// Configured value in mm/s
        value: f32,
    },
    /// Max acceleration must be > 0
    InvalidMaxAcceleration {
        /// Axis with the invalid value
        axis: Axis,
        /// Configured value in mm/s²
        value: f32,
    },
    /// Default or retract acceleration must be > 0
    InvalidAcceleration(f32),
    /// Junction deviation must be > 0
    InvalidJunctionDeviation(f32),
    /// Travel envelope must satisfy min < max
    InvalidTravelRange {
        /// Axis with the invalid range
        axis: Axis,
        /// Minimum position in mm
        min: f32,
        /// Maximum position in mm
        max: f32,
    },
    /// Step-rate bounds must satisfy 0 < min < max
    InvalidStepRateBounds {
        /// Minimum step rate in steps/s
        min: u32,
        /// Maximum step rate in steps/s
        max: u32,
    },
    /// Machine limits carry a different geometry than the transform requires
    KinematicsMismatch {
        /// Geometry the transform constructor requires
        expected: &'static str,
    },
    /// Delta geometry is not solvable (arm length must exceed the radius)
    InvalidDeltaGeometry {
        /// Diagonal arm length in mm
        arm_length: f32,
        /// Tower circle radius in mm
        radius: f32,
    },
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Kinematic transform errors.
///
/// Both variants are reported before any block is enqueued; a move is never
/// partially planned.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KinematicsError {
    /// The geometry has no solution for this Cartesian target
    OutOfReach {
        /// Requested X in mm
        x: f32,
        /// Requested Y in mm
        y: f32,
        /// Requested Z in mm
        z: f32,
    },
    /// Target lies outside the configured travel envelope
    LimitExceeded {
        /// Offending axis
        axis: Axis,
        /// Requested position in mm
        target: f32,
    },
}

/// Motion planning errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// The block queue is full; retry after the engine retires a block.
    ///
    /// This is backpressure, not a fault: the move was not dropped and the
    /// caller is expected to resubmit it.
    QueueFull,
    /// A single move needs more steps on one axis than a block can carry.
    ///
    /// Step counts ride in 32-bit block fields; split the move into shorter
    /// segments instead.
    MoveTooLong {
        /// Offending axis
        axis: Axis,
        /// Requested step delta on that axis
        steps: i64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Kinematics(e) => write!(f, "Kinematics error: {}", e),
            Error::Plan(e) => write!(f, "Planning error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidStepsPerMm { axis, value } => {
                write!(f, "Invalid steps/mm for {:?}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidMaxFeedrate { axis, value } => {
                write!(f, "Invalid max feedrate for {:?}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidMaxAcceleration { axis, value } => {
                write!(f, "Invalid max acceleration for {:?}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidJunctionDeviation(v) => {
                write!(f, "Invalid junction deviation: {}. Must be > 0", v)
            }
            ConfigError::InvalidTravelRange { axis, min, max } => {
                write!(
                    f,
                    "Invalid travel range for {:?}: min ({}) must be < max ({})",
                    axis, min, max
                )
            }
            ConfigError::InvalidStepRateBounds { min, max } => {
                write!(
                    f,
                    "Invalid step rate bounds: min ({}) must be > 0 and < max ({})",
                    min, max
                )
            }
            ConfigError::KinematicsMismatch { expected } => {
                write!(f, "Machine limits are not configured for {} kinematics", expected)
            }
            ConfigError::InvalidDeltaGeometry { arm_length, radius } => {
                write!(
                    f,
                    "Invalid delta geometry: arm length {} must exceed radius {}",
                    arm_length, radius
                )
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::OutOfReach { x, y, z } => {
                write!(f, "Target ({}, {}, {}) is out of reach", x, y, z)
            }
            KinematicsError::LimitExceeded { axis, target } => {
                write!(f, "Target {} on {:?} exceeds travel limits", target, axis)
            }
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::QueueFull => write!(f, "Block queue is full"),
            PlanError::MoveTooLong { axis, steps } => {
                write!(f, "Move of {} steps on {:?} exceeds the block step range", steps, axis)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<KinematicsError> for Error {
    fn from(e: KinematicsError) -> Self {
        Error::Kinematics(e)
    }
}

impl From<PlanError> for Error {
    fn from(e: PlanError) -> Self {
        Error::Plan(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for KinematicsError {}

#[cfg(feature = "std")]
impl std::error::Error for PlanError {}
