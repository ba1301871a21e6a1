//! Property-based tests for the planner and pulse engine.

use proptest::prelude::*;

use motion_core::stepper::BresenhamState;
use motion_core::{
    AbortFlag, Axis, BlockQueue, Cartesian, CartesianPosition, KinematicsTransform,
    MachineLimits, MotionPlanner, NoEndstops, StepOutput, StepperPulseEngine,
};

const TIMER_HZ: u32 = 2_000_000;

#[derive(Default)]
struct Counter {
    pulses: [u64; 4],
}

impl StepOutput for Counter {
    fn set_direction(&mut self, _axis: Axis, _reverse: bool) {}

    fn pulse(&mut self, axis: Axis) {
        self.pulses[axis.index()] += 1;
    }
}

proptest! {
    /// Bresenham emits exactly the requested step count on every axis, no
    /// matter the ratios.
    #[test]
    fn bresenham_conserves_steps(
        dominant in 1u32..5000,
        fractions in [0.0f64..=1.0, 0.0..=1.0, 0.0..=1.0],
    ) {
        let steps = [
            dominant,
            (dominant as f64 * fractions[0]) as u32,
            (dominant as f64 * fractions[1]) as u32,
            (dominant as f64 * fractions[2]) as u32,
        ];
        let mut state = BresenhamState::new(dominant);
        let mut emitted = [0u32; 4];
        for _ in 0..dominant {
            let mask = state.advance(&steps, dominant);
            for i in 0..4 {
                if mask & (1 << i) != 0 {
                    emitted[i] += 1;
                }
            }
        }
        prop_assert_eq!(emitted, steps);
    }

    /// Every block a random path produces has a well-formed trapezoid and
    /// junction speeds that chain exit-to-entry.
    #[test]
    fn planned_blocks_always_well_formed(
        points in prop::collection::vec((1.0f32..199.0, 1.0f32..199.0), 1..10),
        feedrate in 5.0f32..250.0,
    ) {
        let limits = MachineLimits::default();
        let kinematics = Cartesian::new(&limits);
        let mut planner = MotionPlanner::new(kinematics, limits);
        let mut queue: BlockQueue<16> = BlockQueue::new();

        for (x, y) in &points {
            planner
                .enqueue(&mut queue, &CartesianPosition::new(*x, *y, 0.0, 0.0), feedrate)
                .ok();
        }

        let mut index = queue.tail();
        let mut prev_exit: Option<f32> = None;
        while index != queue.head() {
            let b = queue.block(index);

            prop_assert!(b.accelerate_until <= b.decelerate_after);
            prop_assert!(b.decelerate_after <= b.step_event_count);
            prop_assert!(b.initial_rate <= b.nominal_rate);
            prop_assert!(b.final_rate <= b.nominal_rate);
            prop_assert!(b.entry_speed <= b.nominal_speed + 1e-3);
            prop_assert!(b.entry_speed <= b.max_entry_speed + 1e-3);

            if let Some(exit) = prev_exit {
                prop_assert!(
                    (exit - b.entry_speed).abs() < 1e-3,
                    "junction discontinuity: exit {} entry {}", exit, b.entry_speed
                );
            }
            prev_exit = Some(b.exit_speed);
            index = BlockQueue::<16>::next_index(index);
        }
    }

    /// Planning the same path twice through recalculation is a fixed point.
    #[test]
    fn recalculation_is_idempotent(
        points in prop::collection::vec((1.0f32..199.0, 1.0f32..199.0), 2..8),
    ) {
        let limits = MachineLimits::default();
        let kinematics = Cartesian::new(&limits);
        let mut planner = MotionPlanner::new(kinematics, limits);
        let mut queue: BlockQueue<16> = BlockQueue::new();

        for (x, y) in &points {
            planner
                .enqueue(&mut queue, &CartesianPosition::new(*x, *y, 0.0, 0.0), 100.0)
                .ok();
        }

        let before: Vec<(f32, u32, u32, u32)> = (0..16)
            .map(|i| {
                let b = queue.block(i);
                (b.entry_speed, b.initial_rate, b.accelerate_until, b.decelerate_after)
            })
            .collect();
        planner.recalculate(&mut queue);
        let after: Vec<(f32, u32, u32, u32)> = (0..16)
            .map(|i| {
                let b = queue.block(i);
                (b.entry_speed, b.initial_rate, b.accelerate_until, b.decelerate_after)
            })
            .collect();
        prop_assert_eq!(before, after);
    }

    /// Executing a random planned move lands the engine exactly on the
    /// kinematic target.
    #[test]
    fn executed_move_is_step_exact(
        x in 0.0f32..200.0,
        y in 0.0f32..200.0,
        e in -5.0f32..5.0,
        feedrate in 5.0f32..200.0,
    ) {
        let limits = MachineLimits::default();
        let engine_limits = limits.clone();
        let kinematics = Cartesian::new(&limits);
        let mut planner = MotionPlanner::new(kinematics, limits);
        let mut queue: BlockQueue<16> = BlockQueue::new();
        let mut engine = StepperPulseEngine::new(TIMER_HZ, &engine_limits);
        let mut out = Counter::default();
        let abort = AbortFlag::new();

        let target = CartesianPosition::new(x, y, 0.0, e);
        planner.enqueue(&mut queue, &target, feedrate).unwrap();

        let mut monitor = NoEndstops;
        for _ in 0..10_000_000u64 {
            engine.tick(&mut queue, &mut out, &mut monitor, &abort);
            if engine.is_idle() && queue.is_empty() {
                break;
            }
        }

        let expected = planner.kinematics().to_steps(&target).unwrap();
        prop_assert_eq!(engine.position(), expected);
        for i in 0..4 {
            prop_assert_eq!(out.pulses[i] as i64, expected.0[i].abs());
        }
    }
}
