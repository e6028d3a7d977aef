//! Top-of-chain tracing.
//!
//! Sits directly under the client callback and records everything that
//! crosses the boundary: frames and timer callbacks heading down, gestures
//! heading up. Purely observational; nothing is transformed.

use tracing::{debug, trace};

use crate::domain::gesture::Gesture;
use crate::domain::hardware::{HardwareState, Stime};
use crate::filters::Filter;

pub struct LoggingFilter {
    next: Box<dyn Filter>,
}

impl LoggingFilter {
    pub fn new(next: Box<dyn Filter>) -> Self {
        Self { next }
    }
}

impl Filter for LoggingFilter {
    fn push_frame(&mut self, frame: &mut HardwareState, out: &mut Vec<Gesture>) -> Option<Stime> {
        trace!(
            timestamp = frame.timestamp,
            buttons = frame.buttons_down,
            fingers = frame.finger_cnt(),
            touches = frame.touch_cnt,
            "hardware frame"
        );
        let before = out.len();
        let timeout = self.next.push_frame(frame, out);
        for gesture in &out[before..] {
            debug!(?gesture, "gesture produced");
        }
        timeout
    }

    fn timer_fired(&mut self, now: Stime, out: &mut Vec<Gesture>) -> Option<Stime> {
        trace!(now, "timer callback");
        let before = out.len();
        let timeout = self.next.timer_fired(now, out);
        for gesture in &out[before..] {
            debug!(?gesture, "gesture produced");
        }
        timeout
    }
}
