//! Multi-axis Bresenham step distribution.
//!
//! The dominant axis steps on every event; the other axes accumulate error
//! and step whenever their accumulator crosses zero. Over a whole block
//! every axis emits exactly its planned step count.

use crate::kinematics::AXIS_COUNT;

/// Per-block Bresenham error accumulators.
#[derive(Debug, Clone, Copy)]
pub struct BresenhamState {
    counters: [i32; AXIS_COUNT],
}

impl BresenhamState {
    /// Seed the accumulators for a block with the given dominant-axis step
    /// count. The half-count offset centers the sub-dominant pulses within
    /// the event train.
    pub fn new(step_event_count: u32) -> Self {
        Self {
            counters: [-((step_event_count >> 1) as i32); AXIS_COUNT],
        }
    }

    /// Advance one step event.
    ///
    /// Returns a bitmask of the axes that must pulse on this event, bit
    /// index matching the axis index.
    pub fn advance(&mut self, steps: &[u32; AXIS_COUNT], step_event_count: u32) -> u8 {
        let mut mask = 0u8;
        for i in 0..AXIS_COUNT {
            self.counters[i] += steps[i] as i32;
            if self.counters[i] > 0 {
                self.counters[i] -= step_event_count as i32;
                mask |= 1 << i;
            }
        }
        mask
    }
}
