//! Linear delta kinematics.
//!
//! Three vertical towers spaced 120° apart carry sliders joined to the
//! effector by fixed-length diagonal arms. The inverse transform (Cartesian
//! to carriage heights) is a per-tower square-root solve; the forward
//! transform intersects the three arm spheres (trilateration).

use libm::{cosf, sinf, sqrtf};

use crate::config::{KinematicsConfig, MachineLimits};
use crate::error::{ConfigError, KinematicsError};

use super::{mm_to_steps, ActuatorSteps, Axis, CartesianPosition, KinematicsTransform, AXIS_COUNT};

/// Tower azimuths, 120° apart with tower 3 at the back (90°).
const TOWER_ANGLES_DEG: [f32; 3] = [210.0, 330.0, 90.0];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

impl Vec3 {
    const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    fn add_scaled(self, rhs: Self, s: f32) -> Self {
        Self::new(self.x + rhs.x * s, self.y + rhs.y * s, self.z + rhs.z * s)
    }

    fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    fn norm(self) -> f32 {
        sqrtf(self.dot(self))
    }

    fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Delta transform for machines with three towers and diagonal arms.
#[derive(Debug, Clone)]
pub struct Delta {
    steps_per_mm: [f32; AXIS_COUNT],
    /// Diagonal arm length squared, mm².
    arm_length_sq: f32,
    /// Print-area radius squared, mm².
    print_radius_sq: f32,
    /// Allowed effector height range in mm (from the Z travel envelope).
    z_min: f32,
    z_max: f32,
    /// Tower pivot XY positions in mm.
    towers: [[f32; 2]; 3],
}

impl Delta {
    /// Build the transform from machine limits.
    ///
    /// Geometry parameters come from the `Delta` variant of
    /// [`KinematicsConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KinematicsMismatch`] when the limits carry a
    /// different geometry, and [`ConfigError::InvalidDeltaGeometry`] when
    /// the arms cannot span the tower circle.
    pub fn new(limits: &MachineLimits) -> Result<Self, ConfigError> {
        let (arm_length, radius, print_radius) = match limits.kinematics {
            KinematicsConfig::Delta {
                arm_length,
                radius,
                print_radius,
            } => (arm_length, radius, print_radius),
            _ => return Err(ConfigError::KinematicsMismatch { expected: "delta" }),
        };
        if arm_length <= radius {
            return Err(ConfigError::InvalidDeltaGeometry { arm_length, radius });
        }

        let mut towers = [[0.0f32; 2]; 3];
        for (i, angle) in TOWER_ANGLES_DEG.iter().enumerate() {
            let rad = angle * core::f32::consts::PI / 180.0;
            towers[i] = [radius * cosf(rad), radius * sinf(rad)];
        }

        Ok(Self {
            steps_per_mm: limits.steps_per_mm,
            arm_length_sq: arm_length * arm_length,
            print_radius_sq: print_radius * print_radius,
            z_min: limits.travel[2].min.0,
            z_max: limits.travel[2].max.0,
            towers,
        })
    }

    /// Carriage height for one tower, or None when the arm cannot reach.
    fn carriage_height(&self, tower: usize, x: f32, y: f32, z: f32) -> Option<f32> {
        let dx = self.towers[tower][0] - x;
        let dy = self.towers[tower][1] - y;
        let disc = self.arm_length_sq - dx * dx - dy * dy;
        if disc < 0.0 {
            None
        } else {
            Some(z + sqrtf(disc))
        }
    }
}

impl KinematicsTransform for Delta {
    fn to_steps(&self, position: &CartesianPosition) -> Result<ActuatorSteps, KinematicsError> {
        if position.x * position.x + position.y * position.y > self.print_radius_sq {
            return Err(KinematicsError::OutOfReach {
                x: position.x,
                y: position.y,
                z: position.z,
            });
        }
        if position.z < self.z_min || position.z > self.z_max {
            return Err(KinematicsError::LimitExceeded {
                axis: Axis::Z,
                target: position.z,
            });
        }

        let mut steps = [0i64; AXIS_COUNT];
        for tower in 0..3 {
            let height = self
                .carriage_height(tower, position.x, position.y, position.z)
                .ok_or(KinematicsError::OutOfReach {
                    x: position.x,
                    y: position.y,
                    z: position.z,
                })?;
            steps[tower] = mm_to_steps(height, self.steps_per_mm[tower]);
        }
        steps[3] = mm_to_steps(position.e, self.steps_per_mm[3]);

        Ok(ActuatorSteps(steps))
    }

    fn to_cartesian(&self, steps: &ActuatorSteps) -> CartesianPosition {
        // Trilateration: intersect the three spheres centered on the
        // carriages, radius = arm length. The effector is the lower of the
        // two intersection points.
        let p: [Vec3; 3] = core::array::from_fn(|i| {
            Vec3::new(
                self.towers[i][0],
                self.towers[i][1],
                steps.0[i] as f32 / self.steps_per_mm[i],
            )
        });

        let d12 = p[1].sub(p[0]);
        let d13 = p[2].sub(p[0]);

        let d = d12.norm();
        let ex = d12.scale(1.0 / d);
        let i = ex.dot(d13);
        let ey_raw = d13.sub(ex.scale(i));
        let ey = ey_raw.scale(1.0 / ey_raw.norm());
        let ez = ex.cross(ey);
        let j = ey.dot(d13);

        // Equal radii on all three spheres simplify the standard solution.
        let xn = d * 0.5;
        let yn = (i * i + j * j) / (2.0 * j) - (i / j) * xn;
        let zn_sq = self.arm_length_sq - xn * xn - yn * yn;
        let zn = -sqrtf(if zn_sq > 0.0 { zn_sq } else { 0.0 });

        let effector = p[0]
            .add_scaled(ex, xn)
            .add_scaled(ey, yn)
            .add_scaled(ez, zn);

        CartesianPosition {
            x: effector.x,
            y: effector.y,
            z: effector.z,
            e: steps.0[3] as f32 / self.steps_per_mm[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::UnitExt;
    use crate::config::TravelRange;

    fn delta_limits() -> MachineLimits {
        let mut limits = MachineLimits::default();
        limits.steps_per_mm = [100.0, 100.0, 100.0, 93.0];
        limits.kinematics = KinematicsConfig::Delta {
            arm_length: 250.0,
            radius: 124.0,
            print_radius: 90.0,
        };
        limits.travel[2] = TravelRange::new(0.0.mm(), 300.0.mm());
        limits
    }

    #[test]
    fn test_non_delta_limits_are_rejected() {
        let result = Delta::new(&MachineLimits::default());
        assert!(matches!(
            result,
            Err(ConfigError::KinematicsMismatch { expected: "delta" })
        ));
    }

    #[test]
    fn test_arms_shorter_than_radius_are_rejected() {
        let mut limits = delta_limits();
        limits.kinematics = KinematicsConfig::Delta {
            arm_length: 100.0,
            radius: 124.0,
            print_radius: 90.0,
        };
        assert!(matches!(
            Delta::new(&limits),
            Err(ConfigError::InvalidDeltaGeometry { .. })
        ));
    }

    #[test]
    fn test_center_is_symmetric() {
        let k = Delta::new(&delta_limits()).unwrap();
        let steps = k
            .to_steps(&CartesianPosition::new(0.0, 0.0, 10.0, 0.0))
            .unwrap();

        // All towers are equidistant from the center.
        assert_eq!(steps.0[0], steps.0[1]);
        assert_eq!(steps.0[1], steps.0[2]);
    }

    #[test]
    fn test_round_trip() {
        let k = Delta::new(&delta_limits()).unwrap();
        for &(x, y, z) in &[(0.0, 0.0, 5.0), (40.0, -25.0, 80.0), (-60.0, 30.0, 150.0)] {
            let pos = CartesianPosition::new(x, y, z, 1.5);
            let back = k.to_cartesian(&k.to_steps(&pos).unwrap());

            assert!((back.x - x).abs() < 0.05, "x for ({x}, {y}, {z})");
            assert!((back.y - y).abs() < 0.05, "y for ({x}, {y}, {z})");
            assert!((back.z - z).abs() < 0.05, "z for ({x}, {y}, {z})");
        }
    }

    #[test]
    fn test_outside_print_radius_is_out_of_reach() {
        let k = Delta::new(&delta_limits()).unwrap();
        let result = k.to_steps(&CartesianPosition::new(80.0, 80.0, 10.0, 0.0));

        assert!(matches!(result, Err(KinematicsError::OutOfReach { .. })));
    }

    #[test]
    fn test_z_limit() {
        let k = Delta::new(&delta_limits()).unwrap();
        let result = k.to_steps(&CartesianPosition::new(0.0, 0.0, 400.0, 0.0));

        assert!(matches!(
            result,
            Err(KinematicsError::LimitExceeded { axis: Axis::Z, .. })
        ));
    }
}
