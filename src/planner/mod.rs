//! Look-ahead motion planner.
//!
//! Converts Cartesian move requests into [`MotionBlock`]s in actuator step
//! space, assigns each block a trapezoidal velocity profile, and re-plans
//! junction speeds across the whole queue so the machine carries as much
//! speed through corners as the acceleration limits allow.

mod block;
mod junction;
mod queue;

pub use block::MotionBlock;
pub use junction::{junction_speed_limit, MINIMUM_PLANNER_SPEED};
pub use queue::{BlockQueue, BLOCK_QUEUE_SIZE};

use libm::{ceilf, fabsf};

use crate::config::MachineLimits;
use crate::error::{PlanError, Result};
use crate::kinematics::{
    ActuatorSteps, Axis, CartesianPosition, KinematicsTransform, AXIS_COUNT,
};
use crate::profile::{calculate_trapezoid, max_allowable_speed};

/// The planning producer.
///
/// Owns the planner's idea of the current position, in both spaces, which
/// always reflects the end of the last *enqueued* move rather than where
/// the machine physically is right now.
#[derive(Debug)]
pub struct MotionPlanner<K: KinematicsTransform> {
    kinematics: K,
    limits: MachineLimits,
    /// Actuator position at the end of the planned queue.
    position_steps: ActuatorSteps,
    /// Cartesian mirror of `position_steps`.
    position_mm: CartesianPosition,
    /// Unit direction of the previous enqueued move, for junction analysis.
    previous_unit: Option<[f32; AXIS_COUNT]>,
    previous_nominal_speed: f32,
}

impl<K: KinematicsTransform> MotionPlanner<K> {
    /// Create a planner at the Cartesian origin.
    pub fn new(kinematics: K, limits: MachineLimits) -> Self {
        Self {
            kinematics,
            limits,
            position_steps: ActuatorSteps::ZERO,
            position_mm: CartesianPosition::ORIGIN,
            previous_unit: None,
            previous_nominal_speed: 0.0,
        }
    }

    /// Cartesian position at the end of the planned queue.
    pub fn position(&self) -> &CartesianPosition {
        &self.position_mm
    }

    /// The configured machine limits.
    pub fn limits(&self) -> &MachineLimits {
        &self.limits
    }

    /// The kinematic transform in use.
    pub fn kinematics(&self) -> &K {
        &self.kinematics
    }

    /// Declare the machine to be at `position` without moving.
    ///
    /// Breaks the junction chain: the next move is planned from rest.
    pub fn set_position(&mut self, position: &CartesianPosition) -> Result<()> {
        self.position_steps = self.kinematics.to_steps(position)?;
        self.position_mm = *position;
        self.previous_unit = None;
        self.previous_nominal_speed = 0.0;
        Ok(())
    }

    /// Re-adopt the engine's actuator position after an abort.
    pub fn resync_from_steps(&mut self, steps: ActuatorSteps) {
        self.position_steps = steps;
        self.position_mm = self.kinematics.to_cartesian(&steps);
        self.previous_unit = None;
        self.previous_nominal_speed = 0.0;
    }

    /// Plan a straight-line move to `target` at `feedrate` mm/s and push it
    /// onto the queue.
    ///
    /// Fails without side effects when the target is unreachable, when any
    /// axis needs more steps than a block can carry, or when the queue is
    /// full; a move whose dominant-axis step count is at or below the drop
    /// threshold is accepted and silently merged into the next move.
    pub fn enqueue<const N: usize>(
        &mut self,
        queue: &mut BlockQueue<N>,
        target: &CartesianPosition,
        feedrate: f32,
    ) -> Result<()> {
        let target_steps = self.kinematics.to_steps(target)?;

        let mut steps = [0u32; AXIS_COUNT];
        let mut direction_bits = 0u8;
        let mut step_event_count = 0u32;
        for i in 0..AXIS_COUNT {
            let delta = target_steps.0[i] - self.position_steps.0[i];
            // Step counts ride in u32 block fields and i32 Bresenham
            // accumulators. The travel envelope bounds XYZ but the extruder
            // is unbounded, so the delta must be checked before truncation.
            if delta.unsigned_abs() > i32::MAX as u64 {
                return Err(PlanError::MoveTooLong {
                    axis: Axis::from_index(i),
                    steps: delta,
                }
                .into());
            }
            if delta < 0 {
                direction_bits |= 1 << i;
            }
            steps[i] = delta.unsigned_abs() as u32;
            step_event_count = step_event_count.max(steps[i]);
        }

        // Sub-threshold segments are not worth a queue slot. The planner
        // position stays put, so the displacement folds into the next move.
        if step_event_count <= self.limits.drop_segment_steps {
            return Ok(());
        }
        if queue.is_full() {
            return Err(PlanError::QueueFull.into());
        }

        let delta_mm = target.delta(&self.position_mm);
        let millimeters = self.position_mm.distance_to(target);
        let inverse_mm = 1.0 / millimeters;
        let mut unit = [0.0f32; AXIS_COUNT];
        for i in 0..AXIS_COUNT {
            unit[i] = delta_mm[i] * inverse_mm;
        }

        // Feedrate floors keep extrusion pressure and travel moves from
        // degenerating into near-zero-speed blocks.
        let extruding = steps[3] != 0;
        let floor = if extruding {
            self.limits.min_feedrate.0
        } else {
            self.limits.min_travel_feedrate.0
        };
        let mut feedrate = feedrate.max(floor).max(MINIMUM_PLANNER_SPEED);

        // Scale the whole move down so no single axis exceeds its feedrate
        // limit.
        let mut speed_factor = 1.0f32;
        for i in 0..AXIS_COUNT {
            let axis_speed = fabsf(delta_mm[i]) * inverse_mm * feedrate;
            let axis_limit = self.limits.max_feedrate[i].0;
            if axis_speed > axis_limit {
                speed_factor = speed_factor.min(axis_limit / axis_speed);
            }
        }
        feedrate *= speed_factor;

        let steps_per_mm_of_travel = step_event_count as f32 * inverse_mm;
        let mut nominal_speed = feedrate;
        let mut nominal_rate = ceilf(nominal_speed * steps_per_mm_of_travel) as u32;
        if nominal_rate > self.limits.max_step_rate.0 {
            nominal_speed *= self.limits.max_step_rate.0 as f32 / nominal_rate as f32;
            nominal_rate = self.limits.max_step_rate.0;
        }

        // Extruder-only moves get their own (gentler) acceleration; all
        // others start from the default and are reduced until no axis
        // exceeds its per-axis steps/s² limit.
        let travel_only = steps[0] == 0 && steps[1] == 0 && steps[2] == 0;
        let base_acceleration = if travel_only {
            self.limits.retract_acceleration.0
        } else {
            self.limits.acceleration.0
        };
        let mut acceleration_steps = base_acceleration * steps_per_mm_of_travel;
        for i in 0..AXIS_COUNT {
            if steps[i] == 0 {
                continue;
            }
            let axis_share = acceleration_steps * steps[i] as f32 / step_event_count as f32;
            let axis_limit = self.limits.max_acceleration_steps(i);
            if axis_share > axis_limit {
                acceleration_steps = axis_limit * step_event_count as f32 / steps[i] as f32;
            }
        }
        let acceleration = acceleration_steps / steps_per_mm_of_travel;

        // Junction speed with the previous move; a cold start plans from
        // near rest.
        let max_entry_speed = match &self.previous_unit {
            Some(prev_unit) => junction_speed_limit(
                prev_unit,
                &unit,
                self.previous_nominal_speed,
                nominal_speed,
                self.limits.junction_deviation.0,
                acceleration,
            ),
            None => MINIMUM_PLANNER_SPEED,
        };

        // Entry may not exceed the speed from which the block can still
        // brake to the planner minimum within its own length.
        let allowable = max_allowable_speed(acceleration, MINIMUM_PLANNER_SPEED, millimeters);
        let entry_speed = max_entry_speed.min(allowable);

        let slot = match queue.free_slot() {
            Some(slot) => slot,
            None => return Err(PlanError::QueueFull.into()),
        };
        *slot = MotionBlock::EMPTY;
        slot.steps = steps;
        slot.direction_bits = direction_bits;
        slot.step_event_count = step_event_count;
        slot.millimeters = millimeters;
        slot.acceleration = acceleration;
        slot.acceleration_steps = acceleration_steps;
        slot.nominal_speed = nominal_speed;
        slot.nominal_rate = nominal_rate;
        slot.max_entry_speed = max_entry_speed;
        slot.entry_speed = entry_speed;
        slot.exit_speed = MINIMUM_PLANNER_SPEED;
        slot.nominal_length = nominal_speed <= allowable;
        slot.recalculate = true;
        calculate_trapezoid(
            slot,
            entry_speed,
            MINIMUM_PLANNER_SPEED,
            self.limits.min_step_rate.0,
        );
        queue.commit();

        self.previous_unit = Some(unit);
        self.previous_nominal_speed = nominal_speed;
        self.position_steps = target_steps;
        self.position_mm = *target;

        self.recalculate(queue);
        Ok(())
    }

    /// Re-plan junction speeds across every non-busy block in the queue.
    ///
    /// Three passes in the classic look-ahead shape: a reverse pass pulls
    /// entry speeds down so every block can brake in time, a forward pass
    /// pushes them back up to what acceleration can actually deliver, and a
    /// final pass rebuilds the trapezoids of every block whose speeds moved.
    /// Idempotent: running it again without new blocks changes nothing.
    pub fn recalculate<const N: usize>(&mut self, queue: &mut BlockQueue<N>) {
        if queue.is_empty() {
            return;
        }

        self.reverse_pass(queue);
        self.forward_pass(queue);
        self.trapezoid_pass(queue);
    }

    fn reverse_pass<const N: usize>(&mut self, queue: &mut BlockQueue<N>) {
        let tail = queue.tail();
        let mut index = queue.head();
        let mut next_entry: Option<f32> = None;

        while index != tail {
            index = BlockQueue::<N>::prev_index(index);
            if queue.block(index).busy {
                break;
            }

            if let Some(next_entry_speed) = next_entry {
                let block = queue.block_mut(index);
                if block.entry_speed != block.max_entry_speed {
                    let entry = if !block.nominal_length
                        && block.max_entry_speed > next_entry_speed
                    {
                        block.max_entry_speed.min(max_allowable_speed(
                            block.acceleration,
                            next_entry_speed,
                            block.millimeters,
                        ))
                    } else {
                        block.max_entry_speed
                    };
                    if block.entry_speed != entry {
                        block.entry_speed = entry;
                        block.recalculate = true;
                    }
                }
            }
            next_entry = Some(queue.block(index).entry_speed);
        }
    }

    fn forward_pass<const N: usize>(&mut self, queue: &mut BlockQueue<N>) {
        let head = queue.head();
        let mut index = queue.tail();
        let mut prev: Option<(f32, f32, f32, bool)> = None;

        while index != head {
            let block = queue.block(index);
            if block.busy {
                // The engine will hand over at the busy block's planned exit
                // speed; treat that as a zero-length predecessor.
                prev = Some((block.exit_speed, block.acceleration, 0.0, false));
                index = BlockQueue::<N>::next_index(index);
                continue;
            }

            if let Some((prev_entry, prev_accel, prev_mm, prev_nominal_length)) = prev {
                // A block can only enter as fast as the previous one could
                // accelerate to over its own length.
                if !prev_nominal_length {
                    let block = queue.block_mut(index);
                    if prev_entry < block.entry_speed {
                        let reachable =
                            max_allowable_speed(prev_accel, prev_entry, prev_mm);
                        if reachable < block.entry_speed {
                            block.entry_speed = reachable;
                            block.recalculate = true;
                        }
                    }
                }
            }

            let block = queue.block(index);
            prev = Some((
                block.entry_speed,
                block.acceleration,
                block.millimeters,
                block.nominal_length,
            ));
            index = BlockQueue::<N>::next_index(index);
        }
    }

    fn trapezoid_pass<const N: usize>(&mut self, queue: &mut BlockQueue<N>) {
        let head = queue.head();
        let min_step_rate = self.limits.min_step_rate.0;
        let mut index = queue.tail();

        while index != head {
            let next_index = BlockQueue::<N>::next_index(index);
            let last = next_index == head;

            let exit_speed = if last {
                // The final block always plans down to the floor; if another
                // move arrives in time, recalculation raises it again.
                MINIMUM_PLANNER_SPEED
            } else {
                queue.block(next_index).entry_speed
            };

            let needs_rebuild = {
                let block = queue.block(index);
                !block.busy
                    && (block.recalculate
                        || block.exit_speed != exit_speed
                        || (!last && queue.block(next_index).recalculate))
            };
            if needs_rebuild {
                let block = queue.block_mut(index);
                let entry_speed = block.entry_speed;
                block.exit_speed = exit_speed;
                calculate_trapezoid(block, entry_speed, exit_speed, min_step_rate);
                block.recalculate = false;
            }

            index = next_index;
        }
    }
}
