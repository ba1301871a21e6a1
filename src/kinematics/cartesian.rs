//! Cartesian kinematics: one actuator per axis.

use crate::config::{MachineLimits, TravelRange};
use crate::error::KinematicsError;

use super::{mm_to_steps, ActuatorSteps, Axis, CartesianPosition, KinematicsTransform, AXIS_COUNT};

/// Straight-through transform for machines with independent X/Y/Z carriages.
#[derive(Debug, Clone)]
pub struct Cartesian {
    steps_per_mm: [f32; AXIS_COUNT],
    travel: [TravelRange; 3],
}

impl Cartesian {
    /// Build the transform from machine limits.
    pub fn new(limits: &MachineLimits) -> Self {
        Self {
            steps_per_mm: limits.steps_per_mm,
            travel: limits.travel,
        }
    }
}

/// Reject targets outside the configured box. Shared by the gantry
/// geometries, which have the same rectangular envelope.
pub(super) fn check_travel(
    travel: &[TravelRange; 3],
    position: &CartesianPosition,
) -> Result<(), KinematicsError> {
    let coords = [position.x, position.y, position.z];
    for (i, &target) in coords.iter().enumerate() {
        if !travel[i].contains(target) {
            return Err(KinematicsError::LimitExceeded {
                axis: Axis::from_index(i),
                target,
            });
        }
    }
    Ok(())
}

impl KinematicsTransform for Cartesian {
    fn to_steps(&self, position: &CartesianPosition) -> Result<ActuatorSteps, KinematicsError> {
        check_travel(&self.travel, position)?;

        Ok(ActuatorSteps([
            mm_to_steps(position.x, self.steps_per_mm[0]),
            mm_to_steps(position.y, self.steps_per_mm[1]),
            mm_to_steps(position.z, self.steps_per_mm[2]),
            mm_to_steps(position.e, self.steps_per_mm[3]),
        ]))
    }

    fn to_cartesian(&self, steps: &ActuatorSteps) -> CartesianPosition {
        CartesianPosition {
            x: steps.0[0] as f32 / self.steps_per_mm[0],
            y: steps.0[1] as f32 / self.steps_per_mm[1],
            z: steps.0[2] as f32 / self.steps_per_mm[2],
            e: steps.0[3] as f32 / self.steps_per_mm[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> Cartesian {
        Cartesian::new(&MachineLimits::default())
    }

    #[test]
    fn test_round_trip() {
        let k = transform();
        let pos = CartesianPosition::new(10.0, 20.0, 1.5, 4.2);
        let steps = k.to_steps(&pos).unwrap();

        assert_eq!(steps.0[0], 800);
        assert_eq!(steps.0[1], 1600);
        assert_eq!(steps.0[2], 600);

        let back = k.to_cartesian(&steps);
        assert!((back.x - pos.x).abs() < 0.01);
        assert!((back.y - pos.y).abs() < 0.01);
        assert!((back.z - pos.z).abs() < 0.01);
        assert!((back.e - pos.e).abs() < 0.01);
    }

    #[test]
    fn test_travel_limit_rejected() {
        let k = transform();
        let result = k.to_steps(&CartesianPosition::new(0.0, 250.0, 0.0, 0.0));

        assert!(matches!(
            result,
            Err(KinematicsError::LimitExceeded { axis: Axis::Y, .. })
        ));
    }

    #[test]
    fn test_extruder_unbounded() {
        // E has no travel envelope; long filament moves are fine.
        let k = transform();
        assert!(k
            .to_steps(&CartesianPosition::new(0.0, 0.0, 0.0, 10_000.0))
            .is_ok());
    }
}
