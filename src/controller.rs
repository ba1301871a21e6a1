//! High-level motion controller.
//!
//! [`MotionController`] wires the planner, the block queue, the pulse
//! engine and the abort flag together behind a small facade: moves go in
//! at the top, timer ticks come in at the bottom, and aborts surface back
//! to the host. Hosts that split planning and stepping across contexts
//! (main loop vs. timer interrupt) use the parts directly instead.

use crate::config::{validate_limits, MachineLimits};
use crate::endstop::{AbortFlag, AbortReason, EndstopMonitor};
use crate::error::Result;
use crate::kinematics::{CartesianPosition, KinematicsTransform};
use crate::planner::{BlockQueue, MotionPlanner, BLOCK_QUEUE_SIZE};
use crate::stepper::{EngineState, StepOutput, StepTimer, StepperPulseEngine};

/// Planner, queue and engine under one roof.
///
/// Single-threaded by construction: all methods take `&mut self`, and the
/// host decides which context calls what. The abort flag is the one piece
/// shared with interrupt context; borrow it with [`Self::abort_flag`].
#[derive(Debug)]
pub struct MotionController<K: KinematicsTransform, const N: usize = BLOCK_QUEUE_SIZE> {
    planner: MotionPlanner<K>,
    engine: StepperPulseEngine,
    queue: BlockQueue<N>,
    abort: AbortFlag,
}

impl<K: KinematicsTransform, const N: usize> MotionController<K, N> {
    /// Build a controller after validating the limits.
    ///
    /// `timer_hz` is the tick rate of the step timer the engine's returned
    /// intervals refer to.
    pub fn new(kinematics: K, limits: MachineLimits, timer_hz: u32) -> Result<Self> {
        validate_limits(&limits)?;
        let engine = StepperPulseEngine::new(timer_hz, &limits);
        Ok(Self {
            planner: MotionPlanner::new(kinematics, limits),
            engine,
            queue: BlockQueue::new(),
            abort: AbortFlag::new(),
        })
    }

    /// Plan a straight-line move to `target` at `feedrate` mm/s.
    ///
    /// # Errors
    ///
    /// Rejects unreachable targets and reports a full queue; both leave
    /// all planned motion untouched.
    pub fn request_linear_move(
        &mut self,
        target: &CartesianPosition,
        feedrate: f32,
    ) -> Result<()> {
        self.planner.enqueue(&mut self.queue, target, feedrate)
    }

    /// Stop now: discard the active block mid-flight and every queued one.
    ///
    /// The engine position keeps every pulse already emitted. The pending
    /// abort must be consumed with [`Self::take_abort`] before planning
    /// resumes.
    pub fn request_immediate_stop(&mut self) {
        self.engine.abort(&mut self.queue);
        self.abort.report(AbortReason::EmergencyStop);
    }

    /// Consume a pending abort, if any.
    ///
    /// Re-synchronizes the planner onto the engine's actual position, so
    /// the next planned move starts from wherever motion really stopped.
    pub fn take_abort(&mut self) -> Option<AbortReason> {
        let reason = self.abort.take()?;
        self.planner.resync_from_steps(self.engine.position());
        Some(reason)
    }

    /// The abort mailbox, for sharing with an interrupt-context engine
    /// wrapper.
    pub fn abort_flag(&self) -> &AbortFlag {
        &self.abort
    }

    /// Machine position derived from the engine's pulse-accurate actuator
    /// counts.
    pub fn current_position(&self) -> CartesianPosition {
        self.planner
            .kinematics()
            .to_cartesian(&self.engine.position())
    }

    /// Cartesian position at the end of the planned queue.
    pub fn planned_position(&self) -> &CartesianPosition {
        self.planner.position()
    }

    /// Declare the machine to be at `position` (after homing). Only valid
    /// while idle with an empty queue.
    pub fn set_position(&mut self, position: &CartesianPosition) -> Result<()> {
        debug_assert!(self.is_idle() && self.queue.is_empty());
        self.planner.set_position(position)?;
        let steps = self.planner.kinematics().to_steps(position)?;
        self.engine.set_position(steps);
        Ok(())
    }

    /// Execute one step event; returns timer ticks until the next.
    pub fn tick<O, M>(&mut self, out: &mut O, monitor: &mut M) -> u32
    where
        O: StepOutput,
        M: EndstopMonitor,
    {
        self.engine.tick(&mut self.queue, out, monitor, &self.abort)
    }

    /// One tick driven through a [`StepTimer`].
    pub fn service<O, M, T>(&mut self, out: &mut O, monitor: &mut M, timer: &mut T)
    where
        O: StepOutput,
        M: EndstopMonitor,
        T: StepTimer,
    {
        self.engine
            .service(&mut self.queue, out, monitor, &self.abort, timer);
    }

    /// Number of planned blocks waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the engine is idle and nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.engine.state() == EngineState::Idle && self.queue.is_empty()
    }

    /// The configured machine limits.
    pub fn limits(&self) -> &MachineLimits {
        self.planner.limits()
    }
}
