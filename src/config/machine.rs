//! Machine limit configuration.
//!
//! [`MachineLimits`] is the opaque configuration input the motion core is
//! initialized with. It is assumed immutable for the lifetime of a motion
//! session.

use serde::Deserialize;

use crate::kinematics::AXIS_COUNT;

use super::units::{Millimeters, MmPerSec, MmPerSecSquared, StepRate};

/// Travel envelope for one Cartesian axis.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TravelRange {
    /// Minimum allowed position in mm.
    #[serde(rename = "min_mm")]
    pub min: Millimeters,

    /// Maximum allowed position in mm.
    #[serde(rename = "max_mm")]
    pub max: Millimeters,
}

impl TravelRange {
    /// Create a new range.
    pub fn new(min: Millimeters, max: Millimeters) -> Self {
        Self { min, max }
    }

    /// Check if the range is valid (min < max).
    pub fn is_valid(&self) -> bool {
        self.min.0 < self.max.0
    }

    /// Check if a position is within the range.
    pub fn contains(&self, position: f32) -> bool {
        position >= self.min.0 && position <= self.max.0
    }
}

/// Machine geometry selection.
///
/// In TOML this is an inline table, e.g.
/// `kinematics = { type = "core_xy" }` or
/// `kinematics = { type = "delta", arm_length_mm = 250.0, radius_mm = 124.0, print_radius_mm = 90.0 }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum KinematicsConfig {
    /// Independent X/Y/Z carriages.
    #[default]
    Cartesian,
    /// CoreXY gantry: A and B motors both move X and Y.
    CoreXy,
    /// CoreXZ gantry: A and B motors both move X and Z.
    CoreXz,
    /// Linear delta with three vertical towers.
    Delta {
        /// Diagonal arm length in mm.
        #[serde(rename = "arm_length_mm")]
        arm_length: f32,
        /// Horizontal distance from machine center to each arm pivot in mm.
        #[serde(rename = "radius_mm")]
        radius: f32,
        /// Radius of the usable circular bed in mm.
        #[serde(rename = "print_radius_mm")]
        print_radius: f32,
    },
}

/// Persisted machine limits, supplied at initialization.
///
/// Per-axis arrays are indexed `[X, Y, Z, E]`. Defaults follow common
/// Cartesian printer firmware values so a minimal TOML file only needs
/// `steps_per_mm`, `max_feedrate_mm_per_sec` and
/// `max_acceleration_mm_per_sec2`.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineLimits {
    /// Steps per millimeter for each actuator.
    pub steps_per_mm: [f32; AXIS_COUNT],

    /// Maximum feedrate per axis in mm/s.
    #[serde(rename = "max_feedrate_mm_per_sec")]
    pub max_feedrate: [MmPerSec; AXIS_COUNT],

    /// Maximum acceleration per axis in mm/s².
    #[serde(rename = "max_acceleration_mm_per_sec2")]
    pub max_acceleration: [MmPerSecSquared; AXIS_COUNT],

    /// Default acceleration for moves that carry XYZ displacement, in mm/s².
    #[serde(default = "default_acceleration", rename = "acceleration_mm_per_sec2")]
    pub acceleration: MmPerSecSquared,

    /// Acceleration for extruder-only moves (retract/prime), in mm/s².
    #[serde(
        default = "default_retract_acceleration",
        rename = "retract_acceleration_mm_per_sec2"
    )]
    pub retract_acceleration: MmPerSecSquared,

    /// Junction deviation for cornering-speed limits, in mm.
    #[serde(default = "default_junction_deviation", rename = "junction_deviation_mm")]
    pub junction_deviation: Millimeters,

    /// Feedrate floor for moves that extrude, in mm/s.
    #[serde(default, rename = "min_feedrate_mm_per_sec")]
    pub min_feedrate: MmPerSec,

    /// Feedrate floor for travel (non-extruding) moves, in mm/s.
    #[serde(default, rename = "min_travel_feedrate_mm_per_sec")]
    pub min_travel_feedrate: MmPerSec,

    /// Lowest step rate the profile may program, in steps/s.
    ///
    /// Keeps the timer interval bounded away from its maximum.
    #[serde(default = "default_min_step_rate")]
    pub min_step_rate: StepRate,

    /// Hard step-rate ceiling, in steps/s.
    ///
    /// Enforced by the pulse engine before every timer reprogram so the
    /// stepper drivers never see a faster pulse train than they are rated
    /// for.
    #[serde(default = "default_max_step_rate")]
    pub max_step_rate: StepRate,

    /// Moves whose dominant-axis step count is at or below this threshold
    /// are accepted and discarded without queueing.
    #[serde(default)]
    pub drop_segment_steps: u32,

    /// Travel envelope for X, Y and Z.
    #[serde(default = "default_travel")]
    pub travel: [TravelRange; 3],

    /// Machine geometry.
    #[serde(default)]
    pub kinematics: KinematicsConfig,
}

fn default_acceleration() -> MmPerSecSquared {
    MmPerSecSquared(3000.0)
}

fn default_retract_acceleration() -> MmPerSecSquared {
    MmPerSecSquared(1500.0)
}

fn default_junction_deviation() -> Millimeters {
    Millimeters(0.013)
}

fn default_min_step_rate() -> StepRate {
    // Below this the 16-bit style interval math of classic controllers
    // overflows; kept as the floor for compatibility with their drivers.
    StepRate(120)
}

fn default_max_step_rate() -> StepRate {
    StepRate(40_000)
}

fn default_travel() -> [TravelRange; 3] {
    [TravelRange::new(Millimeters(0.0), Millimeters(200.0)); 3]
}

impl MachineLimits {
    /// Maximum acceleration of one axis converted to steps/s².
    #[inline]
    pub fn max_acceleration_steps(&self, axis_index: usize) -> f32 {
        self.max_acceleration[axis_index].0 * self.steps_per_mm[axis_index]
    }
}

impl Default for MachineLimits {
    /// Limits of a generic 200 mm Cartesian printer.
    fn default() -> Self {
        Self {
            steps_per_mm: [80.0, 80.0, 400.0, 93.0],
            max_feedrate: [
                MmPerSec(300.0),
                MmPerSec(300.0),
                MmPerSec(5.0),
                MmPerSec(25.0),
            ],
            max_acceleration: [
                MmPerSecSquared(3000.0),
                MmPerSecSquared(3000.0),
                MmPerSecSquared(100.0),
                MmPerSecSquared(10_000.0),
            ],
            acceleration: default_acceleration(),
            retract_acceleration: default_retract_acceleration(),
            junction_deviation: default_junction_deviation(),
            min_feedrate: MmPerSec(0.0),
            min_travel_feedrate: MmPerSec(0.0),
            min_step_rate: default_min_step_rate(),
            max_step_rate: default_max_step_rate(),
            drop_segment_steps: 0,
            travel: default_travel(),
            kinematics: KinematicsConfig::Cartesian,
        }
    }
}
