//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::kinematics::Axis;

use super::machine::{KinematicsConfig, MachineLimits};

/// Validate machine limits.
///
/// Checks:
/// - Steps/mm, feedrates and accelerations are positive on every axis
/// - Junction deviation is positive
/// - Travel ranges satisfy min < max
/// - Step-rate bounds satisfy 0 < min < max
/// - Delta geometry is solvable (arm length exceeds the tower radius)
pub fn validate_limits(limits: &MachineLimits) -> Result<()> {
    for axis in Axis::ALL {
        let i = axis.index();
        if limits.steps_per_mm[i] <= 0.0 {
            return Err(Error::Config(ConfigError::InvalidStepsPerMm {
                axis,
                value: limits.steps_per_mm[i],
            }));
        }
        if limits.max_feedrate[i].0 <= 0.0 {
            return Err(Error::Config(ConfigError::InvalidMaxFeedrate {
                axis,
                value: limits.max_feedrate[i].0,
            }));
        }
        if limits.max_acceleration[i].0 <= 0.0 {
            return Err(Error::Config(ConfigError::InvalidMaxAcceleration {
                axis,
                value: limits.max_acceleration[i].0,
            }));
        }
    }

    if limits.acceleration.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            limits.acceleration.0,
        )));
    }
    if limits.retract_acceleration.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            limits.retract_acceleration.0,
        )));
    }

    if limits.junction_deviation.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidJunctionDeviation(
            limits.junction_deviation.0,
        )));
    }

    for (i, range) in limits.travel.iter().enumerate() {
        if !range.is_valid() {
            return Err(Error::Config(ConfigError::InvalidTravelRange {
                axis: Axis::from_index(i),
                min: range.min.0,
                max: range.max.0,
            }));
        }
    }

    if limits.min_step_rate.0 == 0 || limits.min_step_rate.0 >= limits.max_step_rate.0 {
        return Err(Error::Config(ConfigError::InvalidStepRateBounds {
            min: limits.min_step_rate.0,
            max: limits.max_step_rate.0,
        }));
    }

    if let KinematicsConfig::Delta {
        arm_length, radius, ..
    } = limits.kinematics
    {
        if arm_length <= radius || radius <= 0.0 {
            return Err(Error::Config(ConfigError::InvalidDeltaGeometry {
                arm_length,
                radius,
            }));
        }
    }

    Ok(())
}
