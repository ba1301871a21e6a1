//! Integration tests for the look-ahead planner.

use motion_core::{
    Axis, BlockQueue, Cartesian, CartesianPosition, Error, KinematicsError, MachineLimits,
    MotionPlanner, PlanError,
};

const QUEUE: usize = 16;

fn planner_with(limits: MachineLimits) -> MotionPlanner<Cartesian> {
    let kinematics = Cartesian::new(&limits);
    MotionPlanner::new(kinematics, limits)
}

fn planner() -> MotionPlanner<Cartesian> {
    planner_with(MachineLimits::default())
}

fn queue() -> BlockQueue<QUEUE> {
    BlockQueue::new()
}

fn xy(x: f32, y: f32) -> CartesianPosition {
    CartesianPosition::new(x, y, 0.0, 0.0)
}

#[test]
fn square_path_slows_at_every_corner() {
    let mut p = planner();
    let mut q = queue();

    for target in [xy(40.0, 0.0), xy(40.0, 40.0), xy(0.0, 40.0), xy(0.0, 0.0)] {
        p.enqueue(&mut q, &target, 150.0).unwrap();
    }
    assert_eq!(q.len(), 4);

    // Every junction is a 90 degree corner: entries are above standstill
    // but well below nominal speed.
    let mut index = q.tail();
    let mut first = true;
    while index != q.head() {
        let block = q.block(index);
        if !first {
            assert!(block.entry_speed > 0.05, "corner entry too slow");
            assert!(
                block.entry_speed < 0.5 * block.nominal_speed,
                "corner entry {} too fast vs nominal {}",
                block.entry_speed,
                block.nominal_speed
            );
        }
        first = false;
        index = BlockQueue::<QUEUE>::next_index(index);
    }
}

#[test]
fn straight_chain_cruises_through_junctions() {
    let mut p = planner();
    let mut q = queue();

    for i in 1..=5 {
        p.enqueue(&mut q, &xy(i as f32 * 20.0, 0.0), 100.0).unwrap();
    }

    let mut index = q.tail();
    let mut first = true;
    while index != q.head() {
        let block = q.block(index);
        if !first {
            assert!(
                (block.entry_speed - block.nominal_speed).abs() < 1.0,
                "straight junction entry {} should be near nominal {}",
                block.entry_speed,
                block.nominal_speed
            );
        }
        first = false;
        index = BlockQueue::<QUEUE>::next_index(index);
    }
}

#[test]
fn entry_speeds_respect_braking_distance() {
    // Long fast move followed by a short one ending the queue: the short
    // block must be enterable at a speed it can brake away within its own
    // length.
    let mut p = planner();
    let mut q = queue();

    p.enqueue(&mut q, &xy(100.0, 0.0), 200.0).unwrap();
    p.enqueue(&mut q, &xy(100.5, 0.0), 200.0).unwrap();

    let short = q.block(BlockQueue::<QUEUE>::next_index(q.tail()));
    let braking_limit =
        (0.05f32 * 0.05 + 2.0 * short.acceleration * short.millimeters).sqrt();
    assert!(
        short.entry_speed <= braking_limit + 0.01,
        "entry {} exceeds braking limit {}",
        short.entry_speed,
        braking_limit
    );
    // And the long block's exit matches that entry.
    let long = q.block(q.tail());
    assert!((long.exit_speed - short.entry_speed).abs() < 1e-3);
}

#[test]
fn queue_full_is_backpressure_not_loss() {
    let mut p = planner();
    let mut q: BlockQueue<4> = BlockQueue::new();

    for i in 1..=3 {
        p.enqueue(&mut q, &xy(i as f32 * 10.0, 0.0), 60.0).unwrap();
    }
    let before = *p.position();

    let err = p.enqueue(&mut q, &xy(99.0, 0.0), 60.0).unwrap_err();
    assert!(matches!(err, Error::Plan(_)));
    assert_eq!(p.position(), &before);
    assert_eq!(q.len(), 3);

    // After the engine retires a block, the same move goes through.
    q.activate();
    q.retire();
    p.enqueue(&mut q, &xy(99.0, 0.0), 60.0).unwrap();
}

#[test]
fn unreachable_target_leaves_planner_untouched() {
    let mut p = planner();
    let mut q = queue();

    let err = p.enqueue(&mut q, &xy(-50.0, 0.0), 60.0).unwrap_err();
    assert!(matches!(
        err,
        Error::Kinematics(KinematicsError::LimitExceeded { .. })
    ));
    assert!(q.is_empty());
    assert_eq!(p.position(), &CartesianPosition::ORIGIN);
}

#[test]
fn oversized_extruder_move_is_rejected() {
    // The travel envelope bounds XYZ but not E; a block's per-axis step
    // count must still fit its 32-bit fields and the i32 accumulators.
    let mut p = planner();
    let mut q = queue();

    let err = p
        .enqueue(&mut q, &CartesianPosition::new(0.0, 0.0, 0.0, 5.0e7), 10.0)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Plan(PlanError::MoveTooLong { axis: Axis::E, .. })
    ));
    assert!(q.is_empty());
    assert_eq!(p.position(), &CartesianPosition::ORIGIN);

    // The same filament split into sane segments still plans.
    p.enqueue(&mut q, &CartesianPosition::new(0.0, 0.0, 0.0, 100.0), 10.0)
        .unwrap();
    assert_eq!(q.len(), 1);
}

#[test]
fn trapezoid_boundaries_stay_inside_block() {
    let mut p = planner();
    let mut q = queue();

    let targets = [
        xy(0.3, 0.0),
        xy(0.3, 0.3),
        xy(60.0, 0.3),
        xy(60.0, 60.0),
        xy(0.0, 0.0),
    ];
    for target in targets {
        p.enqueue(&mut q, &target, 180.0).unwrap();
    }

    let mut index = q.tail();
    while index != q.head() {
        let b = q.block(index);
        assert!(b.accelerate_until <= b.decelerate_after);
        assert!(b.decelerate_after <= b.step_event_count);
        assert!(b.initial_rate <= b.nominal_rate);
        assert!(b.final_rate <= b.nominal_rate);
        index = BlockQueue::<QUEUE>::next_index(index);
    }
}

#[test]
fn feedrate_floor_applies_to_extruding_moves() {
    let mut limits = MachineLimits::default();
    limits.min_feedrate = motion_core::MmPerSec(2.0);
    let mut p = planner_with(limits);
    let mut q = queue();

    p.enqueue(&mut q, &CartesianPosition::new(10.0, 0.0, 0.0, 0.5), 0.1)
        .unwrap();

    let block = q.block(q.tail());
    assert!(block.nominal_speed >= 2.0 - 1e-3);
}

#[test]
fn max_step_rate_caps_nominal_rate() {
    let mut limits = MachineLimits::default();
    limits.max_step_rate = motion_core::StepRate(10_000);
    // Allow a feedrate that would otherwise demand 24k steps/s on X.
    limits.max_feedrate[0] = motion_core::MmPerSec(400.0);
    let mut p = planner_with(limits);
    let mut q = queue();

    p.enqueue(&mut q, &xy(100.0, 0.0), 300.0).unwrap();

    let block = q.block(q.tail());
    assert!(block.nominal_rate <= 10_000);
    // Speed was scaled down with the rate.
    assert!(block.nominal_speed <= 125.01);
}
