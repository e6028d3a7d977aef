//! Integer scroll conditioning.
//!
//! Clients expect whole-pixel scroll and wheel deltas, but a finger rolled
//! slowly produces many sub-unit deltas that must not be lost. Every
//! scroll/wheel delta is truncated toward zero and the fractional part
//! carried into the next gesture, so the sum delivered converges on the
//! true motion. When contact genuinely ends, a deadline clears the carried
//! fractions so a later unrelated drag doesn't inherit a stale bias.

use tracing::warn;

use crate::domain::gesture::{FlingState, Gesture, GestureKind};
use crate::domain::hardware::{HardwareState, Stime};
use crate::filters::{Filter, TimerMux};

/// Quiescence required after the last scroll before remainders clear.
const REMAINDER_RESET_DELAY: Stime = 1.0;

/// Truncate toward zero, accumulating the fraction in `carry`.
fn truncate(input: f64, carry: &mut f64) -> f64 {
    let total = input + *carry;
    let whole = total.trunc();
    *carry = total - whole;
    whole
}

pub struct IntegralFilter {
    next: Box<dyn Filter>,

    h_scroll: f64,
    v_scroll: f64,
    h_scroll_ordinal: f64,
    v_scroll_ordinal: f64,

    /// Set while the most recent frame had no contact at all; only then
    /// may the reset deadline clear the remainders.
    can_clear_remainders: bool,
    remainder_reset_deadline: Option<Stime>,
    mux: TimerMux,
}

impl IntegralFilter {
    pub fn new(next: Box<dyn Filter>) -> Self {
        Self {
            next,
            h_scroll: 0.0,
            v_scroll: 0.0,
            h_scroll_ordinal: 0.0,
            v_scroll_ordinal: 0.0,
            can_clear_remainders: false,
            remainder_reset_deadline: None,
            mux: TimerMux::default(),
        }
    }

    fn consume(&mut self, mut gesture: Gesture, out: &mut Vec<Gesture>) {
        let (start_time, end_time) = (gesture.start_time, gesture.end_time);
        match &mut gesture.kind {
            GestureKind::Move {
                dx,
                dy,
                ordinal_dx,
                ordinal_dy,
            } => {
                // Moves are never truncated here; fractional pixels are
                // the client's concern. All-zero moves are noise.
                let emit =
                    *dx != 0.0 || *dy != 0.0 || *ordinal_dx != 0.0 || *ordinal_dy != 0.0;
                if emit {
                    out.push(gesture);
                }
            }
            GestureKind::Scroll {
                dx,
                dy,
                ordinal_dx,
                ordinal_dy,
                stop_fling,
            } => {
                *dx = truncate(*dx, &mut self.h_scroll);
                *dy = truncate(*dy, &mut self.v_scroll);
                *ordinal_dx = truncate(*ordinal_dx, &mut self.h_scroll_ordinal);
                *ordinal_dy = truncate(*ordinal_dy, &mut self.v_scroll_ordinal);
                let emit =
                    *dx != 0.0 || *dy != 0.0 || *ordinal_dx != 0.0 || *ordinal_dy != 0.0;
                let stop_fling = *stop_fling;
                if emit {
                    out.push(gesture);
                } else if stop_fling {
                    // The scroll rounded away to nothing, but it still has
                    // to stop an ongoing fling.
                    out.push(Gesture::fling(
                        start_time,
                        end_time,
                        0.0,
                        0.0,
                        FlingState::TapDown,
                    ));
                }
                self.remainder_reset_deadline = Some(end_time + REMAINDER_RESET_DELAY);
            }
            GestureKind::MouseWheel {
                dx,
                dy,
                tick_120ths_dx,
                tick_120ths_dy,
            } => {
                // Wheel and scroll share one accumulator pair, so a wheel
                // notch right after a touch scroll keeps the sub-pixel
                // carry.
                *dx = truncate(*dx, &mut self.h_scroll);
                *dy = truncate(*dy, &mut self.v_scroll);
                let emit = *dx != 0.0 || *dy != 0.0 || *tick_120ths_dx != 0 || *tick_120ths_dy != 0;
                if emit {
                    out.push(gesture);
                }
                self.remainder_reset_deadline = Some(end_time + REMAINDER_RESET_DELAY);
            }
            _ => out.push(gesture),
        }
    }

    fn clear_remainders(&mut self) {
        self.h_scroll = 0.0;
        self.v_scroll = 0.0;
        self.h_scroll_ordinal = 0.0;
        self.v_scroll_ordinal = 0.0;
    }
}

impl Filter for IntegralFilter {
    fn push_frame(&mut self, frame: &mut HardwareState, out: &mut Vec<Gesture>) -> Option<Stime> {
        self.can_clear_remainders = frame.fingers.is_empty() && frame.touch_cnt == 0;
        let mut produced = Vec::new();
        let next_timeout = self.next.push_frame(frame, &mut produced);
        for gesture in produced {
            self.consume(gesture, out);
        }
        self.mux
            .arm(frame.timestamp, self.remainder_reset_deadline, next_timeout)
    }

    fn timer_fired(&mut self, now: Stime, out: &mut Vec<Gesture>) -> Option<Stime> {
        if self.mux.next_is_due(self.remainder_reset_deadline) {
            if self.mux.next_deadline().is_some_and(|d| d > now) {
                warn!(
                    now,
                    deadline = self.mux.next_deadline(),
                    "spurious timer callback"
                );
                return None;
            }
            let mut produced = Vec::new();
            let next_timeout = self.next.timer_fired(now, &mut produced);
            for gesture in produced {
                self.consume(gesture, out);
            }
            self.mux.arm(now, self.remainder_reset_deadline, next_timeout)
        } else {
            if self.remainder_reset_deadline.is_some_and(|d| d > now) {
                warn!(
                    now,
                    deadline = self.remainder_reset_deadline,
                    "spurious timer callback"
                );
                return None;
            }
            if self.can_clear_remainders {
                self.clear_remainders();
            }
            self.remainder_reset_deadline = None;
            let next_timeout = self.mux.remaining(now);
            self.mux.arm(now, None, next_timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hardware::FingerState;
    use crate::filters::testing::FakeSource;

    fn touching_frame(timestamp: Stime) -> HardwareState {
        let finger = FingerState {
            pressure: 1.0,
            tracking_id: 1,
            ..Default::default()
        };
        HardwareState::new(timestamp, 0, 1, vec![finger])
    }

    fn empty_frame(timestamp: Stime) -> HardwareState {
        HardwareState::new(timestamp, 0, 0, vec![])
    }

    fn push(
        filter: &mut IntegralFilter,
        frame: &mut HardwareState,
    ) -> (Option<Gesture>, Option<Stime>) {
        let mut out = Vec::new();
        let timeout = filter.push_frame(frame, &mut out);
        assert!(out.len() <= 1);
        (out.pop(), timeout)
    }

    fn scroll_deltas(g: &Gesture) -> (f64, f64) {
        match g.kind {
            GestureKind::Scroll { dx, dy, .. } => (dx, dy),
            _ => panic!("not a scroll: {:?}", g),
        }
    }

    #[test]
    fn test_truncate_carries_fraction() {
        let mut carry = 0.0;
        assert_eq!(truncate(-20.9, &mut carry), -20.0);
        assert!((carry + 0.9).abs() < 1e-9);
        assert_eq!(truncate(0.5, &mut carry), 0.0);
        assert_eq!(truncate(0.5, &mut carry), 0.0);
        assert_eq!(truncate(0.9, &mut carry), 1.0);
    }

    #[test]
    fn test_overflow_sequence() {
        let mut scrolls = vec![
            Some(Gesture::scroll(0.0, 0.0, -20.9, 4.2)),
            Some(Gesture::scroll(0.0, 0.0, 0.8, 1.7)),
            Some(Gesture::scroll(0.0, 0.0, -0.8, 2.2)),
            Some(Gesture::scroll(0.0, 0.0, -0.2, 0.0)),
            Some(Gesture::scroll(0.0, 0.0, -0.2, 0.0)),
        ];
        if let Some(Some(Gesture {
            kind: GestureKind::Scroll { stop_fling, .. },
            ..
        })) = scrolls.last_mut()
        {
            *stop_fling = true;
        }
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(scrolls)));

        let expected = [
            Some((-20.0, 4.0)),
            Some((0.0, 1.0)),
            Some((0.0, 3.0)),
            Some((-1.0, 0.0)),
            None, // becomes a fling instead
        ];
        for (i, want) in expected.into_iter().enumerate() {
            let (gesture, _) = push(&mut filter, &mut touching_frame(10000.0));
            let gesture = gesture.unwrap_or_else(|| panic!("no gesture at step {}", i));
            match want {
                Some((dx, dy)) => {
                    let got = scroll_deltas(&gesture);
                    assert_eq!(got, (dx, dy), "step {}", i);
                }
                None => match gesture.kind {
                    GestureKind::Fling { vx, vy, state, .. } => {
                        assert_eq!((vx, vy), (0.0, 0.0));
                        assert_eq!(state, FlingState::TapDown);
                    }
                    _ => panic!("expected a tap-down fling, got {:?}", gesture),
                },
            }
        }
    }

    #[test]
    fn test_slow_scroll_accumulates() {
        let scrolls = (0..5)
            .map(|i| {
                let t = 10000.0 + 0.05 * i as f64;
                Some(Gesture::scroll(t, t, 0.0, 0.4))
            })
            .collect();
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(scrolls)));

        let mut emitted = Vec::new();
        for i in 0..5 {
            let (gesture, _) = push(&mut filter, &mut empty_frame(10000.0 + 0.05 * i as f64));
            emitted.push(gesture.map(|g| scroll_deltas(&g).1));
        }
        assert_eq!(emitted, vec![None, None, Some(1.0), None, Some(1.0)]);
    }

    #[test]
    fn test_remainders_reset_after_quiescence() {
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(vec![
            Some(Gesture::scroll(10000.0, 10000.0, 3.9, 0.0)),
            None,
            Some(Gesture::scroll(10001.02, 10001.02, 0.2, 0.0)),
        ])));

        let (gesture, timeout) = push(&mut filter, &mut touching_frame(10000.0));
        assert_eq!(scroll_deltas(&gesture.unwrap()), (3.0, 0.0));
        // Reset deadline is one second past the scroll.
        assert_eq!(timeout, Some(1.0));

        // All fingers leave; nothing produced, deadline still pending.
        let (gesture, timeout) = push(&mut filter, &mut empty_frame(10000.01));
        assert!(gesture.is_none());
        assert!(timeout.is_some());

        // Quiescence expires: the 0.9 remainder is gone, so the later 0.2
        // scroll truncates to nothing.
        let mut out = Vec::new();
        assert_eq!(filter.timer_fired(10001.02, &mut out), None);
        assert!(out.is_empty());
        let (gesture, _) = push(&mut filter, &mut touching_frame(10001.02));
        assert!(gesture.is_none());
    }

    #[test]
    fn test_brief_lift_does_not_reset() {
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(vec![
            Some(Gesture::scroll(10000.0, 10000.0, 3.9, 0.0)),
            Some(Gesture::scroll(10000.5, 10000.5, 0.2, 0.0)),
        ])));

        let (gesture, _) = push(&mut filter, &mut touching_frame(10000.0));
        assert_eq!(scroll_deltas(&gesture.unwrap()), (3.0, 0.0));

        // The finger is back before the deadline: the frame shows contact,
        // so even when the timer later fires the remainders survive.
        let (gesture, _) = push(&mut filter, &mut touching_frame(10000.5));
        // 0.9 + 0.2 = 1.1 -> a whole pixel comes out.
        assert_eq!(scroll_deltas(&gesture.unwrap()), (1.0, 0.0));
    }

    #[test]
    fn test_zero_gestures_suppressed() {
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(vec![
            Some(Gesture::pointer_move(0.0, 0.0, 0.0, 0.0)),
            Some(Gesture::scroll(0.0, 0.0, 0.0, 0.0)),
        ])));

        let (gesture, _) = push(&mut filter, &mut empty_frame(10000.0));
        assert!(gesture.is_none());
        let (gesture, _) = push(&mut filter, &mut empty_frame(10000.01));
        assert!(gesture.is_none());
    }

    #[test]
    fn test_moves_forwarded_exactly() {
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(vec![
            Some(Gesture::pointer_move(1.0, 1.01, 0.5, -0.25)),
        ])));

        let (gesture, _) = push(&mut filter, &mut touching_frame(1.01));
        // Fractional moves are preserved, not truncated.
        assert_eq!(
            gesture.unwrap(),
            Gesture::pointer_move(1.0, 1.01, 0.5, -0.25)
        );
    }

    #[test]
    fn test_wheel_shares_scroll_remainders() {
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(vec![
            Some(Gesture::scroll(1.0, 1.0, 0.6, 0.0)),
            Some(Gesture::mouse_wheel(1.1, 1.1, 0.6, 0.0, 7, 0)),
        ])));

        let (gesture, _) = push(&mut filter, &mut touching_frame(1.0));
        // 0.6 truncates away entirely (ordinal too).
        assert!(gesture.is_none());

        // The wheel event picks up the scroll's 0.6 carry: 1.2 -> 1.
        let (gesture, _) = push(&mut filter, &mut touching_frame(1.1));
        match gesture.unwrap().kind {
            GestureKind::MouseWheel { dx, tick_120ths_dx, .. } => {
                assert_eq!(dx, 1.0);
                assert_eq!(tick_120ths_dx, 7);
            }
            other => panic!("expected a wheel event, got {:?}", other),
        }
    }

    #[test]
    fn test_wheel_with_only_ticks_still_forwarded() {
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(vec![
            Some(Gesture::mouse_wheel(1.0, 1.0, 0.3, 0.0, 30, 0)),
        ])));

        // dx truncates to zero but the raw tick motion must reach the
        // client anyway.
        let (gesture, _) = push(&mut filter, &mut touching_frame(1.0));
        match gesture.unwrap().kind {
            GestureKind::MouseWheel { dx, tick_120ths_dx, .. } => {
                assert_eq!(dx, 0.0);
                assert_eq!(tick_120ths_dx, 30);
            }
            other => panic!("expected a wheel event, got {:?}", other),
        }
    }

    #[test]
    fn test_integral_sums_to_true_total() {
        // A burst of fractional deltas whose true sum is integral comes
        // out summing to exactly that integer.
        let deltas = [0.3, 0.3, 0.4, 1.5, -0.5, 2.0];
        let scrolls = deltas
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let t = 1.0 + 0.01 * i as f64;
                Some(Gesture::scroll(t, t, *d, 0.0))
            })
            .collect();
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(scrolls)));

        let mut total = 0.0;
        for i in 0..deltas.len() {
            let (gesture, _) = push(&mut filter, &mut touching_frame(1.0 + 0.01 * i as f64));
            if let Some(g) = gesture {
                total += scroll_deltas(&g).0;
            }
        }
        assert_eq!(total, 4.0);
    }

    #[test]
    fn test_timer_multiplexes_downstream_deadline() {
        let mut source = FakeSource::with_gestures(vec![
            Some(Gesture::scroll(10.0, 10.0, 2.5, 0.0)),
        ]);
        source.frame_timeout = Some(0.25);
        let mut filter = IntegralFilter::new(Box::new(source));

        // Downstream wants 0.25s, our reset wants 1.0s: earliest wins.
        let (_, timeout) = push(&mut filter, &mut touching_frame(10.0));
        assert_eq!(timeout, Some(0.25));

        // That timer belongs downstream; after dispatch the reset deadline
        // (0.75s away now) is reissued.
        let mut out = Vec::new();
        let timeout = filter.timer_fired(10.25, &mut out);
        assert_eq!(timeout, Some(0.75));

        // Now the reset deadline itself fires.
        let timeout = filter.timer_fired(11.0, &mut out);
        assert_eq!(timeout, None);
    }

    #[test]
    fn test_spurious_timer_ignored() {
        let mut filter = IntegralFilter::new(Box::new(FakeSource::with_gestures(vec![
            Some(Gesture::scroll(10.0, 10.0, 3.9, 0.0)),
            Some(Gesture::scroll(10.2, 10.2, 0.2, 0.0)),
        ])));

        let (_, timeout) = push(&mut filter, &mut empty_frame(10.0));
        assert_eq!(timeout, Some(1.0));

        // Fired well before the deadline: no work, no reset.
        let mut out = Vec::new();
        assert_eq!(filter.timer_fired(10.1, &mut out), None);
        assert!(out.is_empty());

        // The remainder survived the bogus callback: 0.2 + 0.9 > 1.
        let (gesture, _) = push(&mut filter, &mut touching_frame(10.2));
        assert_eq!(scroll_deltas(&gesture.unwrap()), (1.0, 0.0));
    }
}
