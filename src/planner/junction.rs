//! Junction deviation cornering limit.
//!
//! Instead of stopping at every corner, consecutive segments are joined at
//! the highest speed whose centripetal acceleration stays within the
//! machine's limit, assuming the corner is rounded by a small virtual arc
//! that deviates at most `junction_deviation` mm from the programmed path.

use libm::sqrtf;

/// Lowest speed the planner will ever assign to a junction, mm/s.
///
/// Blocks never plan all the way to zero between segments; the pulse engine
/// handles the true standstill at queue drain.
pub const MINIMUM_PLANNER_SPEED: f32 = 0.05;

/// Threshold on the junction cosine past which two segments are treated as
/// collinear.
const COLLINEAR_COS: f32 = 0.999_999;

/// Maximum speed through the junction between two segments, mm/s.
///
/// `prev_unit` and `unit` are unit direction vectors over all four axes.
/// Collinear segments pass at full speed; a direction reversal drops to
/// [`MINIMUM_PLANNER_SPEED`]. The result is always capped by the slower of
/// the two nominal speeds.
pub fn junction_speed_limit(
    prev_unit: &[f32; 4],
    unit: &[f32; 4],
    prev_nominal_speed: f32,
    nominal_speed: f32,
    junction_deviation: f32,
    acceleration: f32,
) -> f32 {
    let ceiling = if prev_nominal_speed < nominal_speed {
        prev_nominal_speed
    } else {
        nominal_speed
    };

    // cos(theta) between the incoming and outgoing directions. The previous
    // unit vector points along travel, so no sign flip is needed.
    let mut cos_theta = 0.0f32;
    for i in 0..4 {
        cos_theta += prev_unit[i] * unit[i];
    }

    if cos_theta > COLLINEAR_COS {
        // Straight line continuation.
        return ceiling;
    }
    if cos_theta < -COLLINEAR_COS {
        // Full reversal.
        return MINIMUM_PLANNER_SPEED;
    }

    // sin(theta/2) from the half-angle identity; theta in (0, pi) so the
    // positive root applies.
    let sin_theta_d2 = sqrtf(0.5 * (1.0 - cos_theta));
    let v = sqrtf(acceleration * junction_deviation * sin_theta_d2 / (1.0 - sin_theta_d2));

    let v = if v > ceiling { ceiling } else { v };
    if v < MINIMUM_PLANNER_SPEED {
        MINIMUM_PLANNER_SPEED
    } else {
        v
    }
}
