//! Real-time step pulse generation.
//!
//! [`StepperPulseEngine::tick`] is the per-step-event entry point, written
//! to run from a hardware timer interrupt: integer math only, no
//! allocation, no blocking beyond the configured pulse width. Each tick
//! emits at most one step event and returns the timer delay until the
//! next one.

mod bresenham;
mod output;

pub use bresenham::BresenhamState;
pub use output::{AxisPins, StepDirPins, StepOutput, StepTimer};

use crate::config::MachineLimits;
use crate::endstop::{AbortFlag, EndstopMonitor};
use crate::kinematics::{ActuatorSteps, Axis};
use crate::planner::BlockQueue;
use crate::planner::MotionBlock;
use crate::profile::{interval_ticks, rate_at_step};

/// What the engine is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// No block active, queue drained.
    Idle,
    /// Pulsing through an active block.
    Executing,
}

/// The block the engine owns, with its per-block execution state.
#[derive(Debug, Clone, Copy)]
struct ActiveBlock {
    block: MotionBlock,
    bresenham: BresenhamState,
    step_events_completed: u32,
}

/// The stepping consumer.
///
/// Owns the machine's true actuator position, updated pulse by pulse, so
/// the position is exact even when a block is cut short by an abort.
#[derive(Debug)]
pub struct StepperPulseEngine {
    state: EngineState,
    active: Option<ActiveBlock>,
    position: ActuatorSteps,
    timer_hz: u32,
    /// Interval clamp derived from the configured step-rate bounds.
    min_interval: u32,
    max_interval: u32,
}

impl StepperPulseEngine {
    /// Create an idle engine at actuator position zero.
    ///
    /// `timer_hz` is the tick rate of the hardware timer the returned
    /// intervals are measured in.
    pub fn new(timer_hz: u32, limits: &MachineLimits) -> Self {
        let min_interval = (timer_hz / limits.max_step_rate.0).max(1);
        let max_interval = (timer_hz / limits.min_step_rate.0.max(1)).max(min_interval);
        Self {
            state: EngineState::Idle,
            active: None,
            position: ActuatorSteps::ZERO,
            timer_hz,
            min_interval,
            max_interval,
        }
    }

    /// Current engine state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether nothing is executing.
    pub fn is_idle(&self) -> bool {
        self.state == EngineState::Idle
    }

    /// The machine's actual actuator position, pulse-accurate.
    pub fn position(&self) -> ActuatorSteps {
        self.position
    }

    /// Overwrite the actuator position. Only valid while idle (after
    /// homing, typically).
    pub fn set_position(&mut self, position: ActuatorSteps) {
        debug_assert!(self.active.is_none());
        self.position = position;
    }

    /// Tick interval to return while idle; also the slowest interval the
    /// engine will ever program.
    pub fn idle_interval(&self) -> u32 {
        self.max_interval
    }

    /// Execute one step event.
    ///
    /// Polls the monitor, pulls a block from the queue when needed, emits
    /// the due pulses, and returns the timer delay (in `timer_hz` ticks)
    /// until the next call. Every pulse is mirrored into the engine's
    /// position before this returns, so an abort on the next tick loses
    /// nothing.
    pub fn tick<const N: usize, O, M>(
        &mut self,
        queue: &mut BlockQueue<N>,
        out: &mut O,
        monitor: &mut M,
        abort: &AbortFlag,
    ) -> u32
    where
        O: StepOutput,
        M: EndstopMonitor,
    {
        if let Some(reason) = monitor.check() {
            self.abort(queue);
            abort.report(reason);
            return self.max_interval;
        }

        if self.active.is_none() && !self.activate_next(queue, out) {
            self.state = EngineState::Idle;
            return self.max_interval;
        }

        let (block, mask, completed) = match self.active.as_mut() {
            Some(active) => {
                let mask = active
                    .bresenham
                    .advance(&active.block.steps, active.block.step_event_count);
                active.step_events_completed += 1;
                (active.block, mask, active.step_events_completed)
            }
            None => return self.max_interval,
        };

        for axis in Axis::ALL {
            if mask & (1 << axis.index()) != 0 {
                out.pulse(axis);
                self.position.0[axis.index()] += if block.is_reverse(axis) { -1 } else { 1 };
            }
        }

        if completed >= block.step_event_count {
            queue.retire();
            self.active = None;
            // Chain straight into the next block so collinear junctions
            // keep their planned speed.
            if self.activate_next(queue, out) {
                if let Some(next) = self.active.as_ref() {
                    let rate = rate_at_step(&next.block, 0);
                    return interval_ticks(
                        rate,
                        self.timer_hz,
                        self.min_interval,
                        self.max_interval,
                    );
                }
            }
            self.state = EngineState::Idle;
            return self.max_interval;
        }

        let rate = rate_at_step(&block, completed);
        interval_ticks(rate, self.timer_hz, self.min_interval, self.max_interval)
    }

    /// One tick driven through a [`StepTimer`] instead of a returned value.
    pub fn service<const N: usize, O, M, T>(
        &mut self,
        queue: &mut BlockQueue<N>,
        out: &mut O,
        monitor: &mut M,
        abort: &AbortFlag,
        timer: &mut T,
    ) where
        O: StepOutput,
        M: EndstopMonitor,
        T: StepTimer,
    {
        let interval = self.tick(queue, out, monitor, abort);
        timer.set_next_interval(interval);
    }

    /// Stop immediately: drop the active block mid-flight and flush the
    /// queue. The position keeps every pulse emitted so far.
    pub fn abort<const N: usize>(&mut self, queue: &mut BlockQueue<N>) {
        self.active = None;
        queue.flush();
        self.state = EngineState::Idle;
    }

    fn activate_next<const N: usize, O: StepOutput>(
        &mut self,
        queue: &mut BlockQueue<N>,
        out: &mut O,
    ) -> bool {
        let block = match queue.activate() {
            Some(block) => block,
            None => return false,
        };

        // Direction pins settle before the first pulse of the block.
        for axis in Axis::ALL {
            if block.steps[axis.index()] != 0 {
                out.set_direction(axis, block.is_reverse(axis));
            }
        }

        self.state = EngineState::Executing;
        self.active = Some(ActiveBlock {
            block,
            bresenham: BresenhamState::new(block.step_event_count),
            step_events_completed: 0,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endstop::{AbortReason, NoEndstops};
    use crate::kinematics::CartesianPosition;
    use crate::kinematics::{Cartesian, KinematicsTransform};
    use crate::planner::MotionPlanner;

    const TIMER_HZ: u32 = 2_000_000;

    /// Records direction latches and pulses in call order.
    #[derive(Default)]
    struct Recorder {
        directions: std::vec::Vec<(Axis, bool)>,
        pulses: std::vec::Vec<Axis>,
    }

    impl StepOutput for Recorder {
        fn set_direction(&mut self, axis: Axis, reverse: bool) {
            self.directions.push((axis, reverse));
        }

        fn pulse(&mut self, axis: Axis) {
            self.pulses.push(axis);
        }
    }

    struct TripAfter {
        remaining: u32,
        reason: AbortReason,
    }

    impl EndstopMonitor for TripAfter {
        fn check(&mut self) -> Option<AbortReason> {
            if self.remaining == 0 {
                Some(self.reason)
            } else {
                self.remaining -= 1;
                None
            }
        }
    }

    fn setup() -> (MotionPlanner<Cartesian>, BlockQueue<8>, StepperPulseEngine) {
        let limits = MachineLimits::default();
        let engine = StepperPulseEngine::new(TIMER_HZ, &limits);
        let kinematics = Cartesian::new(&limits);
        (
            MotionPlanner::new(kinematics, limits),
            BlockQueue::new(),
            engine,
        )
    }

    fn run_to_idle(
        engine: &mut StepperPulseEngine,
        queue: &mut BlockQueue<8>,
        out: &mut Recorder,
        abort: &AbortFlag,
    ) {
        let mut monitor = NoEndstops;
        // Generous bound; every test move is far shorter.
        for _ in 0..2_000_000u32 {
            engine.tick(queue, out, &mut monitor, abort);
            if engine.is_idle() && queue.is_empty() {
                return;
            }
        }
        panic!("engine did not drain the queue");
    }

    #[test]
    fn test_idle_engine_returns_idle_interval() {
        let (_, mut queue, mut engine) = setup();
        let mut out = Recorder::default();
        let abort = AbortFlag::new();

        let interval = engine.tick(&mut queue, &mut out, &mut NoEndstops, &abort);
        assert_eq!(interval, engine.idle_interval());
        assert!(engine.is_idle());
        assert!(out.pulses.is_empty());
    }

    #[test]
    fn test_block_executes_to_exact_position() {
        let (mut planner, mut queue, mut engine) = setup();
        let mut out = Recorder::default();
        let abort = AbortFlag::new();

        let target = CartesianPosition::new(5.0, 2.5, 0.0, 0.0);
        planner.enqueue(&mut queue, &target, 100.0).unwrap();
        run_to_idle(&mut engine, &mut queue, &mut out, &abort);

        let expected = planner.kinematics().to_steps(&target).unwrap();
        assert_eq!(engine.position(), expected);
        assert_eq!(
            out.pulses.iter().filter(|a| **a == Axis::X).count(),
            400
        );
        assert_eq!(
            out.pulses.iter().filter(|a| **a == Axis::Y).count(),
            200
        );
    }

    #[test]
    fn test_directions_latched_before_pulses() {
        let (mut planner, mut queue, mut engine) = setup();
        let mut out = Recorder::default();
        let abort = AbortFlag::new();

        planner
            .set_position(&CartesianPosition::new(10.0, 0.0, 0.0, 0.0))
            .unwrap();
        engine.set_position(
            planner
                .kinematics()
                .to_steps(planner.position())
                .unwrap(),
        );
        planner
            .enqueue(&mut queue, &CartesianPosition::new(5.0, 1.0, 0.0, 0.0), 50.0)
            .unwrap();

        engine.tick(&mut queue, &mut out, &mut NoEndstops, &abort);

        assert!(out.directions.contains(&(Axis::X, true)));
        assert!(out.directions.contains(&(Axis::Y, false)));
        assert!(!out.pulses.is_empty());
    }

    #[test]
    fn test_abort_flushes_and_keeps_partial_position() {
        let (mut planner, mut queue, mut engine) = setup();
        let mut out = Recorder::default();
        let abort = AbortFlag::new();

        planner
            .enqueue(&mut queue, &CartesianPosition::new(50.0, 0.0, 0.0, 0.0), 100.0)
            .unwrap();

        let mut monitor = TripAfter {
            remaining: 100,
            reason: AbortReason::HardLimitHit(Axis::X),
        };
        for _ in 0..200 {
            engine.tick(&mut queue, &mut out, &mut monitor, &abort);
            if abort.is_set() {
                break;
            }
        }

        assert_eq!(abort.take(), Some(AbortReason::HardLimitHit(Axis::X)));
        assert!(engine.is_idle());
        assert!(queue.is_empty());
        // Exactly the pulses emitted before the trip.
        assert_eq!(engine.position().0[0], out.pulses.len() as i64);

        // No further pulses after the abort.
        let emitted = out.pulses.len();
        for _ in 0..10 {
            engine.tick(&mut queue, &mut out, &mut NoEndstops, &abort);
        }
        assert_eq!(out.pulses.len(), emitted);
    }

    #[test]
    fn test_blocks_retire_in_order() {
        let (mut planner, mut queue, mut engine) = setup();
        let mut out = Recorder::default();
        let abort = AbortFlag::new();

        planner
            .enqueue(&mut queue, &CartesianPosition::new(2.0, 0.0, 0.0, 0.0), 50.0)
            .unwrap();
        planner
            .enqueue(&mut queue, &CartesianPosition::new(2.0, 2.0, 0.0, 0.0), 50.0)
            .unwrap();
        assert_eq!(queue.len(), 2);

        run_to_idle(&mut engine, &mut queue, &mut out, &abort);

        assert_eq!(engine.position().0[0], 160);
        assert_eq!(engine.position().0[1], 160);
        // The Y move only starts after the X move's last pulse.
        let first_y = out.pulses.iter().position(|a| *a == Axis::Y).unwrap();
        let last_x = out
            .pulses
            .iter()
            .rposition(|a| *a == Axis::X)
            .unwrap();
        assert!(first_y > last_x);
    }
}
