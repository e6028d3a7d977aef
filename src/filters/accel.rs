//! Pointer and scroll acceleration.
//!
//! Every move/scroll/fling/swipe gesture coming up the chain is rescaled
//! by a ratio read off the acceleration curve selected by the user's
//! sensitivity setting and the device class. Ordinal fields keep their
//! pre-acceleration magnitudes (only the per-axis out-scale touches them)
//! so clients can still reason about physical finger travel.

use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::domain::curve::{
    mouse_point_curves, old_mouse_point_curves, ratio_from_curve, touchpad_point_curves,
    touchpad_scroll_curves, unaccel_mouse_curves, unaccel_point_curves, unpack_curve,
    CurveSegment,
};
use crate::domain::gesture::{Gesture, GestureKind};
use crate::domain::hardware::{HardwareState, Stime};
use crate::domain::settings::{AccelSettings, SettingsService};
use crate::filters::Filter;

/// Durations under this produce useless speeds; the gesture is passed
/// through rather than divided by (almost) zero.
const MIN_USABLE_DT: Stime = 0.00001;
/// Speeds under this are noise; the gesture is dropped (flings excepted,
/// a zero-length fling is the "fling ended" marker).
const MIN_USABLE_SPEED: f64 = 0.00001;
/// Remembered frame duration before any reasonable one has been seen.
const INITIAL_REASONABLE_DT: Stime = 0.05;

pub struct AccelFilter {
    next: Box<dyn Filter>,
    settings: Arc<Mutex<SettingsService>>,

    // Built-in curve families, indexed by sensitivity - 1.
    point_curves: Vec<Vec<CurveSegment>>,
    scroll_curves: Vec<Vec<CurveSegment>>,
    mouse_point_curves: Vec<Vec<CurveSegment>>,
    old_mouse_point_curves: Vec<Vec<CurveSegment>>,
    unaccel_point_curves: Vec<CurveSegment>,
    unaccel_mouse_curves: Vec<CurveSegment>,

    last_reasonable_dt: Stime,

    // Speed smoothing ring of capacity two, plus the timestamp used to
    // detect continuity between consecutive gestures.
    last_end_time: Option<Stime>,
    newest_speed: Option<f64>,
    prior_speed: Option<f64>,
}

impl AccelFilter {
    pub fn new(settings: Arc<Mutex<SettingsService>>, next: Box<dyn Filter>) -> Self {
        Self {
            next,
            settings,
            point_curves: touchpad_point_curves(),
            scroll_curves: touchpad_scroll_curves(),
            mouse_point_curves: mouse_point_curves(),
            old_mouse_point_curves: old_mouse_point_curves(),
            unaccel_point_curves: unaccel_point_curves(),
            unaccel_mouse_curves: unaccel_mouse_curves(),
            last_reasonable_dt: INITIAL_REASONABLE_DT,
            last_end_time: None,
            newest_speed: None,
            prior_speed: None,
        }
    }

    fn consume(&mut self, gesture: Gesture, out: &mut Vec<Gesture>) {
        let cfg = self.settings.lock().unwrap().get().accel.clone();
        match gesture.kind {
            GestureKind::Move { .. }
            | GestureKind::Swipe { .. }
            | GestureKind::FourFingerSwipe { .. } => {
                self.accelerate_pointer(&cfg, gesture, out);
            }
            // Non-touch mice get their scroll acceleration upstream, in
            // the wheel conditioning; leave their gestures alone.
            GestureKind::Scroll { .. } | GestureKind::Fling { .. }
                if cfg.use_mouse_scroll_curves =>
            {
                out.push(gesture);
            }
            GestureKind::Scroll { .. } | GestureKind::Fling { .. } => {
                self.accelerate_scroll(&cfg, gesture, out);
            }
            // Nothing to accelerate.
            _ => out.push(gesture),
        }
    }

    fn accelerate_pointer(
        &mut self,
        cfg: &AccelSettings,
        mut gesture: Gesture,
        out: &mut Vec<Gesture>,
    ) {
        let (dx, dy) = match &gesture.kind {
            GestureKind::Move { dx, dy, .. }
            | GestureKind::Swipe { dx, dy, .. }
            | GestureKind::FourFingerSwipe { dx, dy, .. } => (*dx, *dy),
            _ => {
                out.push(gesture);
                return;
            }
        };

        let dt = self.adjusted_dt(&gesture, cfg);
        if dt < MIN_USABLE_DT {
            // Too fast to judge a speed; hand the motion on untouched.
            out.push(gesture);
            return;
        }
        let mut speed = dx.hypot(dy) / dt;
        if cfg.smooth_accel {
            speed = self.smooth_speed(&gesture, speed);
        }
        if speed < MIN_USABLE_SPEED {
            trace!(speed, "dropping sub-threshold pointer gesture");
            return;
        }

        let ratio = self.pointer_ratio(cfg, speed);
        if ratio <= 0.0 {
            trace!(speed, "speed beyond curve, dropping gesture");
            return;
        }
        let x_scale = ratio * cfg.point_x_out_scale;
        let y_scale = ratio * cfg.point_y_out_scale;
        if let GestureKind::Move { dx, dy, .. }
        | GestureKind::Swipe { dx, dy, .. }
        | GestureKind::FourFingerSwipe { dx, dy, .. } = &mut gesture.kind
        {
            *dx *= x_scale;
            *dy *= y_scale;
        }
        out.push(gesture);
    }

    fn accelerate_scroll(
        &mut self,
        cfg: &AccelSettings,
        mut gesture: Gesture,
        out: &mut Vec<Gesture>,
    ) {
        let speed = match &gesture.kind {
            GestureKind::Scroll { dx, dy, .. } => {
                let dt = self.adjusted_dt(&gesture, cfg);
                if dt < MIN_USABLE_DT {
                    None
                } else {
                    Some(dx.hypot(*dy) / dt)
                }
            }
            GestureKind::Fling { vx, vy, .. } => {
                // Flings carry velocities (dt is one by definition), but a
                // sane fling duration still refreshes the dt memory.
                self.adjusted_dt(&gesture, cfg);
                Some(vx.hypot(*vy))
            }
            _ => None,
        };
        let Some(mut speed) = speed else {
            out.push(gesture);
            return;
        };

        if cfg.smooth_accel {
            speed = self.smooth_speed(&gesture, speed);
        }
        if speed < MIN_USABLE_SPEED {
            // Zero-length flings signal "fling over" and must survive.
            if matches!(gesture.kind, GestureKind::Fling { .. }) {
                out.push(gesture);
            }
            return;
        }

        let ratio = self.scroll_ratio(cfg, speed);
        if ratio <= 0.0 {
            trace!(speed, "speed beyond curve, dropping gesture");
            return;
        }
        match &mut gesture.kind {
            GestureKind::Scroll {
                dx,
                dy,
                ordinal_dx,
                ordinal_dy,
                ..
            } => {
                *dx *= ratio * cfg.scroll_x_out_scale;
                *dy *= ratio * cfg.scroll_y_out_scale;
                // Ordinals scale but never accelerate; clients use them
                // for gestures measured in physical finger travel.
                *ordinal_dx *= cfg.scroll_x_out_scale;
                *ordinal_dy *= cfg.scroll_y_out_scale;
            }
            GestureKind::Fling {
                vx,
                vy,
                ordinal_vx,
                ordinal_vy,
                ..
            } => {
                *vx *= ratio * cfg.scroll_x_out_scale;
                *vy *= ratio * cfg.scroll_y_out_scale;
                *ordinal_vx *= cfg.scroll_x_out_scale;
                *ordinal_vy *= cfg.scroll_y_out_scale;
            }
            _ => {}
        }
        out.push(gesture);
    }

    /// Frame durations outside the configured bounds are replaced by the
    /// last in-bounds one, so resent wireless packets don't masquerade as
    /// very fast motion.
    fn adjusted_dt(&mut self, gesture: &Gesture, cfg: &AccelSettings) -> Stime {
        let mut dt = gesture.end_time - gesture.start_time;
        if dt < cfg.min_reasonable_dt || dt > cfg.max_reasonable_dt {
            dt = self.last_reasonable_dt;
        } else {
            self.last_reasonable_dt = dt;
        }
        dt
    }

    /// Running mean over the current speed and up to two predecessors.
    /// Any timestamp discontinuity (gap or clock going backwards) restarts
    /// the ring with the current speed.
    fn smooth_speed(&mut self, gesture: &Gesture, speed: f64) -> f64 {
        let mut last_end = self.last_end_time;
        if let Some(end) = last_end {
            if end > gesture.start_time {
                last_end = None;
            }
        }

        let smoothed = if last_end == Some(gesture.start_time) {
            let mut sum = speed;
            let mut count = 1.0;
            for prior in [self.newest_speed, self.prior_speed].into_iter().flatten() {
                sum += prior;
                count += 1.0;
            }
            self.prior_speed = self.newest_speed;
            self.newest_speed = Some(speed);
            sum / count
        } else {
            self.prior_speed = None;
            self.newest_speed = Some(speed);
            speed
        };
        self.last_end_time = Some(gesture.end_time);
        smoothed
    }

    fn pointer_ratio(&self, cfg: &AccelSettings, speed: f64) -> f64 {
        let idx = sensitivity_index(cfg.pointer_sensitivity);
        if cfg.use_mouse_point_curves && cfg.use_custom_mouse_curve {
            ratio_from_curve(unpack_curve(&cfg.custom_mouse_curve), speed)
        } else if !cfg.use_mouse_point_curves && cfg.use_custom_tp_point_curve {
            ratio_from_curve(unpack_curve(&cfg.custom_tp_point_curve), speed)
        } else if cfg.use_mouse_point_curves {
            if !cfg.pointer_acceleration {
                ratio_from_curve([self.unaccel_mouse_curves[idx]], speed)
            } else if cfg.use_old_mouse_point_curves {
                ratio_from_curve(self.old_mouse_point_curves[idx].iter().copied(), speed)
            } else {
                ratio_from_curve(self.mouse_point_curves[idx].iter().copied(), speed)
            }
        } else if !cfg.pointer_acceleration {
            ratio_from_curve([self.unaccel_point_curves[idx]], speed)
        } else {
            ratio_from_curve(self.point_curves[idx].iter().copied(), speed)
        }
    }

    fn scroll_ratio(&self, cfg: &AccelSettings, speed: f64) -> f64 {
        if cfg.use_custom_tp_scroll_curve {
            ratio_from_curve(unpack_curve(&cfg.custom_tp_scroll_curve), speed)
        } else {
            let idx = sensitivity_index(cfg.scroll_sensitivity);
            ratio_from_curve(self.scroll_curves[idx].iter().copied(), speed)
        }
    }
}

fn sensitivity_index(sensitivity: i32) -> usize {
    (sensitivity.clamp(1, 5) - 1) as usize
}

impl Filter for AccelFilter {
    fn push_frame(&mut self, frame: &mut HardwareState, out: &mut Vec<Gesture>) -> Option<Stime> {
        let mut produced = Vec::new();
        let timeout = self.next.push_frame(frame, &mut produced);
        for gesture in produced {
            self.consume(gesture, out);
        }
        timeout
    }

    fn timer_fired(&mut self, now: Stime, out: &mut Vec<Gesture>) -> Option<Stime> {
        let mut produced = Vec::new();
        let timeout = self.next.timer_fired(now, &mut produced);
        for gesture in produced {
            self.consume(gesture, out);
        }
        timeout
    }
}
