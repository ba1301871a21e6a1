//! The motion block: one planned linear segment.

use crate::kinematics::{Axis, AXIS_COUNT};

/// One planned linear motion segment between two kinematic waypoints.
///
/// A block is created and populated by the planner, may be re-planned in
/// place while it waits in the queue, and is frozen the moment the pulse
/// engine marks it `busy`. All fields are plain values so the engine can
/// take its own copy at activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionBlock {
    /// Unsigned step count per actuator for this segment.
    pub steps: [u32; AXIS_COUNT],

    /// Per-axis direction bitmask; bit set = negative travel. Fixed for the
    /// lifetime of the block.
    pub direction_bits: u8,

    /// Dominant-axis step count: the number of step events in the block.
    pub step_event_count: u32,

    /// Cartesian length of the segment in mm.
    pub millimeters: f32,

    /// Acceleration used for this block in mm/s².
    pub acceleration: f32,

    /// Acceleration in steps/s² along the dominant axis.
    pub acceleration_steps: f32,

    /// Planned speed entering the block, mm/s. Mutable until `busy`.
    pub entry_speed: f32,

    /// Cruise speed for the block, mm/s.
    pub nominal_speed: f32,

    /// Planned speed leaving the block, mm/s. Mutable until `busy`.
    pub exit_speed: f32,

    /// Cornering ceiling on `entry_speed` from junction deviation, mm/s.
    pub max_entry_speed: f32,

    /// Step rate at cruise, steps/s.
    pub nominal_rate: u32,

    /// Step rate entering the block, steps/s.
    pub initial_rate: u32,

    /// Step rate leaving the block, steps/s.
    pub final_rate: u32,

    /// Step index where acceleration ends.
    pub accelerate_until: u32,

    /// Step index where deceleration begins.
    pub decelerate_after: u32,

    /// The block can accelerate from standstill to `nominal_speed` within
    /// its own distance. Lets the reverse pass skip the deceleration check.
    pub nominal_length: bool,

    /// Junction speeds changed; the trapezoid must be recomputed before the
    /// block may execute.
    pub recalculate: bool,

    /// The pulse engine owns this block. Set exactly once, never cleared
    /// until the slot is reclaimed.
    pub busy: bool,
}

impl MotionBlock {
    /// An empty, unplanned block (used to initialize queue slots).
    pub const EMPTY: Self = Self {
        steps: [0; AXIS_COUNT],
        direction_bits: 0,
        step_event_count: 0,
        millimeters: 0.0,
        acceleration: 0.0,
        acceleration_steps: 0.0,
        entry_speed: 0.0,
        nominal_speed: 0.0,
        exit_speed: 0.0,
        max_entry_speed: 0.0,
        nominal_rate: 0,
        initial_rate: 0,
        final_rate: 0,
        accelerate_until: 0,
        decelerate_after: 0,
        nominal_length: false,
        recalculate: false,
        busy: false,
    };

    /// Whether this block moves the axis in the negative direction.
    #[inline]
    pub fn is_reverse(&self, axis: Axis) -> bool {
        self.direction_bits & (1 << axis.index()) != 0
    }

    /// Signed step delta this block applies to an axis when it completes.
    #[inline]
    pub fn signed_steps(&self, axis: Axis) -> i64 {
        let steps = self.steps[axis.index()] as i64;
        if self.is_reverse(axis) {
            -steps
        } else {
            steps
        }
    }
}

impl Default for MotionBlock {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_steps() {
        let mut block = MotionBlock::EMPTY;
        block.steps = [100, 50, 0, 25];
        block.direction_bits = 1 << Axis::Y.index();

        assert_eq!(block.signed_steps(Axis::X), 100);
        assert_eq!(block.signed_steps(Axis::Y), -50);
        assert_eq!(block.signed_steps(Axis::Z), 0);
        assert_eq!(block.signed_steps(Axis::E), 25);
    }

    #[test]
    fn test_empty_block_is_inert() {
        let block = MotionBlock::EMPTY;
        assert_eq!(block.step_event_count, 0);
        assert!(!block.busy);
        assert!(!block.recalculate);
    }
}
