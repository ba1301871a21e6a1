//! Trapezoidal velocity profiles.
//!
//! Planner-side math runs in `f32` mm/s; once a block's entry and exit
//! speeds are settled, this module converts them into the integer step
//! rates and phase boundaries the pulse engine consumes. The per-tick rate
//! lookup is pure integer arithmetic so it is safe to call from a timer
//! interrupt.

use libm::{ceilf, floorf, sqrtf};

use crate::planner::MotionBlock;

/// Distance in steps needed to change from `initial_rate` to `target_rate`
/// at `acceleration` steps/s².
pub(crate) fn acceleration_distance(initial_rate: f32, target_rate: f32, acceleration: f32) -> f32 {
    if acceleration == 0.0 {
        return 0.0;
    }
    (target_rate * target_rate - initial_rate * initial_rate) / (2.0 * acceleration)
}

/// Step index where acceleration must hand over to deceleration when the
/// block is too short to reach cruise speed.
pub(crate) fn intersection_distance(
    initial_rate: f32,
    final_rate: f32,
    acceleration: f32,
    distance: f32,
) -> f32 {
    if acceleration == 0.0 {
        return 0.0;
    }
    (2.0 * acceleration * distance - initial_rate * initial_rate + final_rate * final_rate)
        / (4.0 * acceleration)
}

/// Highest speed reachable at the end of `distance` mm when entering at
/// `target_speed` and decelerating at `acceleration` (both mm units).
/// Used backwards by the look-ahead passes.
pub(crate) fn max_allowable_speed(acceleration: f32, target_speed: f32, distance: f32) -> f32 {
    sqrtf(target_speed * target_speed + 2.0 * acceleration * distance)
}

/// Fill in the step-rate fields of a block for the given junction speeds.
///
/// Degenerates to a triangle profile when the block is too short for a
/// cruise phase. Idempotent: re-planning a waiting block just overwrites
/// the same fields.
pub(crate) fn calculate_trapezoid(
    block: &mut MotionBlock,
    entry_speed: f32,
    exit_speed: f32,
    min_step_rate: u32,
) {
    let nominal = if block.nominal_speed > 0.0 {
        block.nominal_speed
    } else {
        1.0
    };
    let entry_factor = (entry_speed / nominal).clamp(0.0, 1.0);
    let exit_factor = (exit_speed / nominal).clamp(0.0, 1.0);

    let mut initial_rate = ceilf(block.nominal_rate as f32 * entry_factor) as u32;
    let mut final_rate = ceilf(block.nominal_rate as f32 * exit_factor) as u32;
    if initial_rate < min_step_rate {
        initial_rate = min_step_rate;
    }
    if final_rate < min_step_rate {
        final_rate = min_step_rate;
    }
    let nominal_rate = block.nominal_rate.max(min_step_rate);
    initial_rate = initial_rate.min(nominal_rate);
    final_rate = final_rate.min(nominal_rate);

    let accel = block.acceleration_steps;
    let mut accelerate_steps = ceilf(acceleration_distance(
        initial_rate as f32,
        nominal_rate as f32,
        accel,
    )) as i64;
    let decelerate_steps = floorf(acceleration_distance(
        nominal_rate as f32,
        final_rate as f32,
        -accel,
    )) as i64;

    let total = block.step_event_count as i64;
    let mut plateau_steps = total - accelerate_steps - decelerate_steps;

    // Not enough distance to cruise: accelerate to a lower peak, then
    // immediately decelerate.
    if plateau_steps < 0 {
        accelerate_steps = ceilf(intersection_distance(
            initial_rate as f32,
            final_rate as f32,
            accel,
            total as f32,
        )) as i64;
        accelerate_steps = accelerate_steps.clamp(0, total);
        plateau_steps = 0;
    }

    block.initial_rate = initial_rate;
    block.final_rate = final_rate;
    block.nominal_rate = nominal_rate;
    block.accelerate_until = accelerate_steps as u32;
    block.decelerate_after = (accelerate_steps + plateau_steps) as u32;
}

/// Integer square root for `u64`, rounding down.
pub(crate) fn isqrt64(value: u64) -> u64 {
    if value == 0 {
        return 0;
    }
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

/// Step rate at step event `n` of a block, steps/s.
///
/// Closed form of the trapezoid: `v(n) = sqrt(v0² + 2·a·n)` on the ramp up
/// and the mirror of it on the ramp down, clamped to the cruise rate.
/// Integer only.
pub(crate) fn rate_at_step(block: &MotionBlock, n: u32) -> u32 {
    let accel2 = (2.0 * block.acceleration_steps) as u64;
    let total = block.step_event_count;

    if n < block.accelerate_until {
        let v0 = block.initial_rate as u64;
        let rate = isqrt64(v0 * v0 + accel2 * n as u64) as u32;
        rate.min(block.nominal_rate)
    } else if n >= block.decelerate_after {
        let vf = block.final_rate as u64;
        let remaining = total.saturating_sub(n) as u64;
        let rate = isqrt64(vf * vf + accel2 * remaining) as u32;
        // The deceleration ramp can never exceed the speed the block
        // actually reached (triangle profiles peak below nominal).
        let v0 = block.initial_rate as u64;
        let peak = isqrt64(v0 * v0 + accel2 * block.accelerate_until as u64) as u32;
        rate.min(peak).min(block.nominal_rate).max(block.final_rate)
    } else {
        block.nominal_rate
    }
}

/// Timer ticks until the next step event at the given rate.
pub(crate) fn interval_ticks(rate: u32, timer_hz: u32, min_interval: u32, max_interval: u32) -> u32 {
    if rate == 0 {
        return max_interval;
    }
    (timer_hz / rate).clamp(min_interval, max_interval)
}
