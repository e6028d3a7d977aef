//! Click-wiggle suppression for clickable-surface touchpads.
//!
//! Pressing the physical button under the pad usually nudges the contact
//! by a millimetre or two, which would otherwise read as cursor motion.
//! Around every button edge this filter anchors each nearby contact and
//! flags its motion as warped until a timeout elapses, so downstream
//! stages ignore the wobble. The anchor is the position at which the
//! click was noticed and never moves while suppression lasts: a wobble
//! stays inside the radius, a genuine drag escapes when the window ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::gesture::Gesture;
use crate::domain::hardware::{finger_flags, HardwareState, Stime};
use crate::domain::settings::{ClickWiggleSettings, SettingsService};
use crate::filters::Filter;

#[derive(Debug, Clone, Copy, PartialEq)]
struct WiggleRec {
    // Position where suppression began (or where the contact first
    // appeared, until a button edge promotes it).
    anchor_x: f64,
    anchor_y: f64,
    began: Stime,
    suppress: bool,
}

pub struct ClickWiggleFilter {
    next: Box<dyn Filter>,
    settings: Arc<Mutex<SettingsService>>,

    recs: HashMap<i32, WiggleRec>,

    /// Timestamp of the last button edge, either direction.
    button_edge_time: Stime,
    /// Whether that edge was a press (a bit turned on).
    button_edge_is_press: bool,
    /// Whether exactly one finger was on the pad during that edge.
    button_edge_with_one_finger: bool,

    prev_buttons: u32,
    /// Pressure per tracking id from the previous frame, kept for sibling
    /// filters with pressure-change heuristics.
    prev_pressure: HashMap<i32, f64>,
}

impl ClickWiggleFilter {
    pub fn new(settings: Arc<Mutex<SettingsService>>, next: Box<dyn Filter>) -> Self {
        Self {
            next,
            settings,
            recs: HashMap::new(),
            button_edge_time: -1.0,
            button_edge_is_press: false,
            button_edge_with_one_finger: false,
            prev_buttons: 0,
            prev_pressure: HashMap::new(),
        }
    }

    /// Pressure this contact reported in the previous frame, if any.
    pub fn previous_pressure(&self, tracking_id: i32) -> Option<f64> {
        self.prev_pressure.get(&tracking_id).copied()
    }

    fn update_wiggle_recs(&mut self, frame: &HardwareState) {
        let cfg = self.settings.lock().unwrap().get().click_wiggle.clone();

        // A lifted finger takes its record with it; a reused slot with a
        // new tracking id is a fresh contact with a fresh anchor.
        self.recs
            .retain(|id, _| frame.finger_by_id(*id).is_some());

        let edge = self.prev_buttons != frame.buttons_down;
        if edge {
            self.button_edge_time = frame.timestamp;
            self.button_edge_is_press = frame.buttons_down & !self.prev_buttons != 0;
            self.button_edge_with_one_finger = frame.finger_cnt() == 1;
        }

        let mut expired = Vec::new();
        for finger in &frame.fingers {
            let rec = self.recs.entry(finger.tracking_id).or_insert(WiggleRec {
                anchor_x: finger.position_x,
                anchor_y: finger.position_y,
                began: frame.timestamp,
                suppress: false,
            });

            if rec.suppress {
                let timeout = suppression_timeout(
                    &cfg,
                    frame.buttons_down,
                    self.button_edge_is_press,
                    self.button_edge_with_one_finger,
                );
                if frame.timestamp - self.button_edge_time > timeout {
                    expired.push(finger.tracking_id);
                }
                // Anchor stays put while suppression lasts.
                continue;
            }

            if edge {
                let dist = (finger.position_x - rec.anchor_x)
                    .hypot(finger.position_y - rec.anchor_y);
                if dist <= cfg.wiggle_max_dist || self.button_edge_with_one_finger {
                    rec.suppress = true;
                    rec.began = frame.timestamp;
                    rec.anchor_x = finger.position_x;
                    rec.anchor_y = finger.position_y;
                }
            }
        }

        // A contact that escaped suppression is forgotten outright; if it
        // is still on the pad the next frame re-seeds it as fresh.
        for id in expired {
            self.recs.remove(&id);
        }
    }

    fn set_warp_flags(&self, frame: &mut HardwareState) {
        for finger in &mut frame.fingers {
            if self
                .recs
                .get(&finger.tracking_id)
                .is_some_and(|rec| rec.suppress)
            {
                finger.flags |= finger_flags::WARP_X | finger_flags::WARP_Y;
            }
        }
    }
}

/// How long a suppressed contact stays suppressed, measured from the most
/// recent button edge. Single-finger presses get their own window; they
/// are the clicks that wiggle the most.
fn suppression_timeout(
    cfg: &ClickWiggleSettings,
    buttons_down: u32,
    edge_is_press: bool,
    edge_with_one_finger: bool,
) -> Stime {
    if edge_is_press && edge_with_one_finger {
        cfg.one_finger_click_wiggle_timeout
    } else if buttons_down != 0 {
        cfg.wiggle_button_down_timeout
    } else {
        cfg.wiggle_suppress_timeout
    }
}

impl Filter for ClickWiggleFilter {
    fn push_frame(&mut self, frame: &mut HardwareState, out: &mut Vec<Gesture>) -> Option<Stime> {
        self.update_wiggle_recs(frame);
        self.set_warp_flags(frame);

        self.prev_buttons = frame.buttons_down;
        self.prev_pressure.clear();
        for finger in &frame.fingers {
            self.prev_pressure.insert(finger.tracking_id, finger.pressure);
        }

        self.next.push_frame(frame, out)
    }

    fn timer_fired(&mut self, now: Stime, out: &mut Vec<Gesture>) -> Option<Stime> {
        self.next.timer_fired(now, out)
    }
}
