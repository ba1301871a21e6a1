//! CoreXY and CoreXZ gantry kinematics.
//!
//! Both motors of the core pair contribute to both Cartesian directions:
//! `A = U + V`, `B = U - V`, where (U, V) is (X, Y) for CoreXY and (X, Z)
//! for CoreXZ. The remaining axis keeps its own carriage.

use crate::config::{MachineLimits, TravelRange};
use crate::error::KinematicsError;

use super::cartesian::check_travel;
use super::{mm_to_steps, ActuatorSteps, CartesianPosition, KinematicsTransform, AXIS_COUNT};

/// CoreXY transform: the A/B belt motors drive X and Y together.
#[derive(Debug, Clone)]
pub struct CoreXy {
    steps_per_mm: [f32; AXIS_COUNT],
    travel: [TravelRange; 3],
}

impl CoreXy {
    /// Build the transform from machine limits.
    ///
    /// `steps_per_mm[0]` and `steps_per_mm[1]` apply to the A and B motors;
    /// core machines normally configure them identically.
    pub fn new(limits: &MachineLimits) -> Self {
        Self {
            steps_per_mm: limits.steps_per_mm,
            travel: limits.travel,
        }
    }
}

impl KinematicsTransform for CoreXy {
    fn to_steps(&self, position: &CartesianPosition) -> Result<ActuatorSteps, KinematicsError> {
        check_travel(&self.travel, position)?;

        Ok(ActuatorSteps([
            mm_to_steps(position.x + position.y, self.steps_per_mm[0]),
            mm_to_steps(position.x - position.y, self.steps_per_mm[1]),
            mm_to_steps(position.z, self.steps_per_mm[2]),
            mm_to_steps(position.e, self.steps_per_mm[3]),
        ]))
    }

    fn to_cartesian(&self, steps: &ActuatorSteps) -> CartesianPosition {
        let a = steps.0[0] as f32 / self.steps_per_mm[0];
        let b = steps.0[1] as f32 / self.steps_per_mm[1];
        CartesianPosition {
            x: 0.5 * (a + b),
            y: 0.5 * (a - b),
            z: steps.0[2] as f32 / self.steps_per_mm[2],
            e: steps.0[3] as f32 / self.steps_per_mm[3],
        }
    }
}

/// CoreXZ transform: the A/B motors drive X and Z together.
#[derive(Debug, Clone)]
pub struct CoreXz {
    steps_per_mm: [f32; AXIS_COUNT],
    travel: [TravelRange; 3],
}

impl CoreXz {
    /// Build the transform from machine limits.
    pub fn new(limits: &MachineLimits) -> Self {
        Self {
            steps_per_mm: limits.steps_per_mm,
            travel: limits.travel,
        }
    }
}

impl KinematicsTransform for CoreXz {
    fn to_steps(&self, position: &CartesianPosition) -> Result<ActuatorSteps, KinematicsError> {
        check_travel(&self.travel, position)?;

        Ok(ActuatorSteps([
            mm_to_steps(position.x + position.z, self.steps_per_mm[0]),
            mm_to_steps(position.y, self.steps_per_mm[1]),
            mm_to_steps(position.x - position.z, self.steps_per_mm[2]),
            mm_to_steps(position.e, self.steps_per_mm[3]),
        ]))
    }

    fn to_cartesian(&self, steps: &ActuatorSteps) -> CartesianPosition {
        let a = steps.0[0] as f32 / self.steps_per_mm[0];
        let c = steps.0[2] as f32 / self.steps_per_mm[2];
        CartesianPosition {
            x: 0.5 * (a + c),
            y: steps.0[1] as f32 / self.steps_per_mm[1],
            z: 0.5 * (a - c),
            e: steps.0[3] as f32 / self.steps_per_mm[3],
        }
    }
}
