//! Hardware output seams for the pulse engine.
//!
//! The engine drives two small traits: [`StepOutput`] for direction and
//! step pulses, [`StepTimer`] for scheduling the next tick. A ready-made
//! [`StepDirPins`] adapter maps them onto `embedded-hal` GPIO pins for
//! step/dir driver boards; hosts with DMA or shift-register step
//! generation implement the traits directly.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::kinematics::{Axis, AXIS_COUNT};

/// Sink for direction changes and step pulses.
///
/// Called from the engine tick, which may run in interrupt context:
/// implementations must not block beyond the pulse width itself.
pub trait StepOutput {
    /// Latch the travel direction of one axis. Always called before the
    /// first pulse of a block, never between pulses of the same block.
    fn set_direction(&mut self, axis: Axis, reverse: bool);

    /// Emit one step pulse on one axis.
    fn pulse(&mut self, axis: Axis);
}

/// Schedules the delay until the engine's next tick.
pub trait StepTimer {
    /// Arm the timer to fire again after `ticks` timer counts.
    fn set_next_interval(&mut self, ticks: u32);
}

/// Step and direction pins for one axis.
pub struct AxisPins<S, D> {
    /// Step pin, pulsed active-high.
    pub step: S,
    /// Direction pin.
    pub dir: D,
    /// Invert the direction signal for motors wired mirror-image.
    pub invert_dir: bool,
}

/// [`StepOutput`] over four pairs of `embedded-hal` step/dir pins.
///
/// GPIO errors cannot be surfaced from pulse context, so the adapter
/// latches the first failure instead; hosts poll [`Self::is_faulted`] from
/// their main loop and abort the machine if it trips.
pub struct StepDirPins<S, D, DL> {
    axes: [AxisPins<S, D>; AXIS_COUNT],
    delay: DL,
    pulse_width_ns: u32,
    faulted: bool,
}

impl<S, D, DL> StepDirPins<S, D, DL>
where
    S: OutputPin,
    D: OutputPin,
    DL: DelayNs,
{
    /// Wrap four axis pin pairs with the given step pulse width.
    pub fn new(axes: [AxisPins<S, D>; AXIS_COUNT], delay: DL, pulse_width_ns: u32) -> Self {
        Self {
            axes,
            delay,
            pulse_width_ns,
            faulted: false,
        }
    }

    /// Whether any pin operation has failed since construction.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Release the pins and delay source.
    pub fn release(self) -> ([AxisPins<S, D>; AXIS_COUNT], DL) {
        (self.axes, self.delay)
    }
}

impl<S, D, DL> StepOutput for StepDirPins<S, D, DL>
where
    S: OutputPin,
    D: OutputPin,
    DL: DelayNs,
{
    fn set_direction(&mut self, axis: Axis, reverse: bool) {
        let pins = &mut self.axes[axis.index()];
        let level = reverse != pins.invert_dir;
        let result = if level {
            pins.dir.set_high()
        } else {
            pins.dir.set_low()
        };
        if result.is_err() {
            self.faulted = true;
        }
    }

    fn pulse(&mut self, axis: Axis) {
        let pins = &mut self.axes[axis.index()];
        if pins.step.set_high().is_err() {
            self.faulted = true;
            return;
        }
        self.delay.delay_ns(self.pulse_width_ns);
        if pins.step.set_low().is_err() {
            self.faulted = true;
        }
    }
}
