//! The filter chain.
//!
//! Each filter owns the filter beneath it (toward the device) and exposes
//! the same two entry points, so the chain composes as a list built
//! bottom-up. Frames flow down through `push_frame`; gestures produced by
//! the stage below come back up and each filter forwards zero or more
//! (possibly transformed) gestures to its caller. Everything is
//! synchronous: the only deferred work a filter may request is a timeout,
//! and the host calls `timer_fired` no earlier than that.

pub mod accel;
pub mod click_wiggle;
pub mod integral;
pub mod logging;

pub use accel::AccelFilter;
pub use click_wiggle::ClickWiggleFilter;
pub use integral::IntegralFilter;
pub use logging::LoggingFilter;

use crate::domain::gesture::Gesture;
use crate::domain::hardware::{HardwareState, Stime};

/// One stage of the pipeline. `None` for a timeout means no timer is
/// required; a timeout is a delay in seconds relative to the call.
pub trait Filter {
    /// Accept one hardware frame. The frame is borrowed for the duration
    /// of the call and may be annotated in place, but not retained.
    /// Gestures produced anywhere below are appended to `out` in order.
    fn push_frame(&mut self, frame: &mut HardwareState, out: &mut Vec<Gesture>) -> Option<Stime>;

    /// A previously requested timeout elapsed.
    fn timer_fired(&mut self, now: Stime, out: &mut Vec<Gesture>) -> Option<Stime>;
}

/// Folds a filter's own deadline with the downstream filter's into the
/// single timeout handed upstream, and remembers the downstream deadline
/// so a later `timer_fired` can be routed to the right party.
#[derive(Debug, Default)]
pub(crate) struct TimerMux {
    next_deadline: Option<Stime>,
}

impl TimerMux {
    /// Record the downstream timeout (as an absolute deadline) and return
    /// the earlier of it and `local_deadline`, as a delay from `now`. A
    /// local deadline already in the past contributes nothing; it is the
    /// timer callback's job to notice it.
    pub fn arm(
        &mut self,
        now: Stime,
        local_deadline: Option<Stime>,
        next_timeout: Option<Stime>,
    ) -> Option<Stime> {
        self.next_deadline = next_timeout.map(|t| now + t);
        let local_timeout = local_deadline.filter(|d| *d > now).map(|d| d - now);
        match (local_timeout, next_timeout) {
            (Some(local), Some(next)) => Some(local.min(next)),
            (Some(local), None) => Some(local),
            (None, next) => next,
        }
    }

    /// True when the downstream deadline fires before the local one and
    /// the callback should be routed downstream.
    pub fn next_is_due(&self, local_deadline: Option<Stime>) -> bool {
        match (self.next_deadline, local_deadline) {
            (Some(next), Some(local)) => next < local,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Stime> {
        self.next_deadline
    }

    /// Remaining delay until the downstream deadline, if it is still in
    /// the future.
    pub fn remaining(&self, now: Stime) -> Option<Stime> {
        self.next_deadline.filter(|d| *d > now).map(|d| d - now)
    }
}
