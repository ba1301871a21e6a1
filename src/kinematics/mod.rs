//! Kinematic transforms between Cartesian space and actuator (stepper) space.
//!
//! Every machine geometry implements [`KinematicsTransform`]: a pure,
//! deterministic mapping from a Cartesian target (plus extruder position) to
//! per-actuator step counts and back. The concrete geometry is selected once
//! at initialization from [`KinematicsConfig`](crate::config::KinematicsConfig);
//! the planner and the pulse engine only ever see the trait.

mod cartesian;
mod corexy;
mod delta;

pub use cartesian::Cartesian;
pub use corexy::{CoreXy, CoreXz};
pub use delta::Delta;

use crate::error::KinematicsError;

/// Number of actuators the core plans for: X, Y, Z plus the extruder.
pub const AXIS_COUNT: usize = 4;

/// A machine axis.
///
/// For non-Cartesian geometries `X`/`Y`/`Z` name the actuators (e.g. the A/B
/// steppers of a CoreXY gantry, or the three towers of a delta), not the
/// Cartesian directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// First actuator (X carriage, CoreXY A motor, delta tower 1).
    X,
    /// Second actuator (Y carriage, CoreXY B motor, delta tower 2).
    Y,
    /// Third actuator (Z carriage or delta tower 3).
    Z,
    /// Extruder.
    E,
}

impl Axis {
    /// All axes, in actuator order.
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Index of this axis into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::E => 3,
        }
    }

    /// Axis from an array index. Panics on indices >= 4.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }
}

/// A Cartesian target position in millimeters, including the extruder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CartesianPosition {
    /// X in mm.
    pub x: f32,
    /// Y in mm.
    pub y: f32,
    /// Z in mm.
    pub z: f32,
    /// Extruder position in mm of filament.
    pub e: f32,
}

impl CartesianPosition {
    /// Create a new position.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, e: f32) -> Self {
        Self { x, y, z, e }
    }

    /// Position at the Cartesian origin with the extruder at zero.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Per-component difference `self - other` as an array `[dx, dy, dz, de]`.
    #[inline]
    pub fn delta(&self, other: &Self) -> [f32; AXIS_COUNT] {
        [
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.e - other.e,
        ]
    }

    /// Euclidean length of the Cartesian component of a move to `target`.
    ///
    /// Falls back to the extruder travel for moves with no XYZ displacement,
    /// so retract/prime moves still carry a meaningful distance.
    pub fn distance_to(&self, target: &Self) -> f32 {
        let [dx, dy, dz, de] = target.delta(self);
        let sq = dx * dx + dy * dy + dz * dz;
        if sq > 0.0 {
            libm::sqrtf(sq)
        } else {
            libm::fabsf(de)
        }
    }
}

/// Absolute actuator positions in steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorSteps(pub [i64; AXIS_COUNT]);

impl ActuatorSteps {
    /// All actuators at zero.
    pub const ZERO: Self = Self([0; AXIS_COUNT]);

    /// Steps for a single axis.
    #[inline]
    pub fn axis(&self, axis: Axis) -> i64 {
        self.0[axis.index()]
    }
}

/// Mapping between Cartesian space and actuator step space.
///
/// Implementations must be pure and side-effect free: the planner calls
/// `to_steps` for every enqueued move, and position reporting calls
/// `to_cartesian` from the engine's retired-block state.
pub trait KinematicsTransform {
    /// Convert a Cartesian position to absolute actuator steps.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::OutOfReach`] when the geometry has no
    /// solution for the target (never a NaN result), and
    /// [`KinematicsError::LimitExceeded`] when the target lies outside the
    /// configured travel envelope.
    fn to_steps(&self, position: &CartesianPosition) -> Result<ActuatorSteps, KinematicsError>;

    /// Convert absolute actuator steps back to a Cartesian position.
    fn to_cartesian(&self, steps: &ActuatorSteps) -> CartesianPosition;
}

/// Round a millimeter coordinate to whole steps.
#[inline]
pub(crate) fn mm_to_steps(mm: f32, steps_per_mm: f32) -> i64 {
    libm::roundf(mm * steps_per_mm) as i64
}
