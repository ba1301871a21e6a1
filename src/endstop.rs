//! Endstop and fault monitoring.
//!
//! The pulse engine polls an [`EndstopMonitor`] at the top of every tick
//! and aborts the instant it reports a reason. Aborts are published to the
//! host through the lock-free [`AbortFlag`], which is safe to share with
//! interrupt context.

use core::sync::atomic::{AtomicU8, Ordering};

use embedded_hal::digital::InputPin;

use crate::kinematics::{Axis, AXIS_COUNT};

/// Why motion was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    /// A hard limit switch triggered on the given axis.
    HardLimitHit(Axis),
    /// Host-requested immediate stop.
    EmergencyStop,
    /// An external thermal or driver fault line tripped.
    ThermalFault,
}

/// Source of abort conditions, polled once per engine tick.
///
/// Implementations must be cheap: a handful of pin reads at most.
pub trait EndstopMonitor {
    /// Check for a stop condition right now.
    fn check(&mut self) -> Option<AbortReason>;
}

/// Monitor for machines without limit switches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEndstops;

impl EndstopMonitor for NoEndstops {
    fn check(&mut self) -> Option<AbortReason> {
        None
    }
}

/// One limit switch on an `embedded-hal` input pin.
pub struct EndstopPin<P> {
    /// The switch input.
    pub pin: P,
    /// Level that means "triggered". Normally-closed switches read high
    /// when idle, so their trigger level is low.
    pub triggered_when_high: bool,
}

impl<P: InputPin> EndstopPin<P> {
    fn is_triggered(&mut self) -> bool {
        // A read error is treated as not triggered; a flaky switch line must
        // not strand the machine mid-print. Wiring faults show up at homing.
        let high = self.pin.is_high().unwrap_or(false);
        high == self.triggered_when_high
    }
}

/// Hard-limit monitor over per-axis endstop pins.
///
/// Axes without a switch (the extruder, usually) carry `None`.
pub struct PinEndstops<P> {
    endstops: [Option<EndstopPin<P>>; AXIS_COUNT],
}

impl<P: InputPin> PinEndstops<P> {
    /// Wrap the given per-axis switches.
    pub fn new(endstops: [Option<EndstopPin<P>>; AXIS_COUNT]) -> Self {
        Self { endstops }
    }
}

impl<P: InputPin> EndstopMonitor for PinEndstops<P> {
    fn check(&mut self) -> Option<AbortReason> {
        for (i, slot) in self.endstops.iter_mut().enumerate() {
            if let Some(endstop) = slot {
                if endstop.is_triggered() {
                    return Some(AbortReason::HardLimitHit(Axis::from_index(i)));
                }
            }
        }
        None
    }
}

const FLAG_CLEAR: u8 = 0;
const FLAG_EMERGENCY_STOP: u8 = 1;
const FLAG_THERMAL_FAULT: u8 = 2;
/// Hard limits encode the axis in the low nibble.
const FLAG_HARD_LIMIT: u8 = 0x10;

/// Lock-free abort mailbox between the engine and the host.
///
/// The engine (possibly in interrupt context) stores the reason; the host
/// consumes it with [`Self::take`]. A single `u8` slot, so a second abort
/// before the first is consumed overwrites it, which is fine: the machine
/// is already stopped.
#[derive(Debug, Default)]
pub struct AbortFlag(AtomicU8);

impl AbortFlag {
    /// A clear flag.
    pub const fn new() -> Self {
        Self(AtomicU8::new(FLAG_CLEAR))
    }

    /// Publish an abort reason.
    pub fn report(&self, reason: AbortReason) {
        let encoded = match reason {
            AbortReason::EmergencyStop => FLAG_EMERGENCY_STOP,
            AbortReason::ThermalFault => FLAG_THERMAL_FAULT,
            AbortReason::HardLimitHit(axis) => FLAG_HARD_LIMIT | axis.index() as u8,
        };
        self.0.store(encoded, Ordering::Release);
    }

    /// Whether an unconsumed abort is pending.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire) != FLAG_CLEAR
    }

    /// Consume and clear the pending abort, if any.
    pub fn take(&self) -> Option<AbortReason> {
        let encoded = self.0.swap(FLAG_CLEAR, Ordering::AcqRel);
        match encoded {
            FLAG_CLEAR => None,
            FLAG_EMERGENCY_STOP => Some(AbortReason::EmergencyStop),
            FLAG_THERMAL_FAULT => Some(AbortReason::ThermalFault),
            _ => Some(AbortReason::HardLimitHit(Axis::from_index(
                (encoded & 0x0F) as usize % AXIS_COUNT,
            ))),
        }
    }
}
