//! Hardware frame model
//!
//! One `HardwareState` is a single snapshot from the input device: the set
//! of tracked contacts plus the relative mouse axes. Frames are borrowed by
//! the filter chain for the duration of one push and may be annotated in
//! place (warp flags), but never retained.

/// Monotonic time in seconds.
pub type Stime = f64;

/// Per-finger flag bits. A "warp" flag means the finger may have moved but
/// that motion must not be turned into cursor/scroll output on that axis.
/// The `*_MOVE` variants gate cursor motion, the `*_NON_MOVE` variants gate
/// everything else (scroll, tap disambiguation).
pub mod finger_flags {
    pub const WARP_X_NON_MOVE: u32 = 1 << 0;
    pub const WARP_Y_NON_MOVE: u32 = 1 << 1;
    /// Finger may not begin a tap gesture.
    pub const NO_TAP: u32 = 1 << 2;
    pub const POSSIBLE_PALM: u32 = 1 << 3;
    pub const PALM: u32 = 1 << 4;
    pub const WARP_X_MOVE: u32 = 1 << 5;
    pub const WARP_Y_MOVE: u32 = 1 << 6;
    /// Warp applied to tap-to-click movement detection.
    pub const WARP_X_TAP_MOVE: u32 = 1 << 7;
    pub const WARP_Y_TAP_MOVE: u32 = 1 << 8;
    /// Finger is merged with, or very close to, another finger.
    pub const MERGE: u32 = 1 << 9;
    pub const TREND_INC_X: u32 = 1 << 10;
    pub const TREND_DEC_X: u32 = 1 << 11;
    pub const TREND_INC_Y: u32 = 1 << 12;
    pub const TREND_DEC_Y: u32 = 1 << 13;
    pub const TREND_INC_PRESSURE: u32 = 1 << 14;
    pub const TREND_DEC_PRESSURE: u32 = 1 << 15;
    pub const TREND_INC_TOUCH_MAJOR: u32 = 1 << 16;
    pub const TREND_DEC_TOUCH_MAJOR: u32 = 1 << 17;
    pub const INSTANTANEOUS_MOVING: u32 = 1 << 18;
    /// Set only when the position is genuinely unknown (sensor jump), as
    /// opposed to known-but-suppressed.
    pub const WARP_TELEPORTATION: u32 = 1 << 19;
    pub const LARGE_PALM: u32 = 1 << 20;

    /// Both warp-x bits; suppressors set move and non-move together.
    pub const WARP_X: u32 = WARP_X_NON_MOVE | WARP_X_MOVE;
    /// Both warp-y bits.
    pub const WARP_Y: u32 = WARP_Y_NON_MOVE | WARP_Y_MOVE;
}

/// Physical button bits for `HardwareState::buttons_down` and the
/// buttons-change gesture masks.
pub mod buttons {
    pub const NONE: u32 = 0;
    pub const LEFT: u32 = 1;
    pub const MIDDLE: u32 = 2;
    pub const RIGHT: u32 = 4;
    pub const BACK: u32 = 8;
    pub const FORWARD: u32 = 16;
    pub const SIDE: u32 = 32;
    pub const EXTRA: u32 = 64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolType {
    #[default]
    Finger,
    Palm,
}

/// One contact on the touch surface. Fields carry the same meaning as the
/// matching ABS_MT_* axes in the Linux evdev protocol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FingerState {
    /// Large and small radii of the contact ellipse.
    pub touch_major: f64,
    pub touch_minor: f64,
    /// Radii including hovering parts; zero if the device doesn't report.
    pub width_major: f64,
    pub width_minor: f64,
    pub pressure: f64,
    pub orientation: f64,
    pub position_x: f64,
    pub position_y: f64,
    /// Stable across frames for the same physical finger; reassigned only
    /// when contact breaks.
    pub tracking_id: i32,
    /// Bit field of `finger_flags`. Zero on incoming frames.
    pub flags: u32,
    pub tool_type: ToolType,
}

impl FingerState {
    pub fn warp_suppressed(&self) -> bool {
        self.flags & (finger_flags::WARP_X | finger_flags::WARP_Y) != 0
    }
}

/// One frame of data from the input device.
#[derive(Debug, Clone, Default)]
pub struct HardwareState {
    /// When the event was received by the system.
    pub timestamp: Stime,
    /// Bit field of `buttons` constants.
    pub buttons_down: u32,
    /// Number of fingers touching the pad; may exceed `fingers.len()` on
    /// devices that can count more contacts than they can track.
    pub touch_cnt: u16,
    /// Tracked contacts, in no particular order; only the tracking id
    /// matters across frames.
    pub fingers: Vec<FingerState>,
    // Mouse relative axes.
    pub rel_x: f64,
    pub rel_y: f64,
    pub rel_wheel: f64,
    pub rel_wheel_hi_res: f64,
    pub rel_hwheel: f64,
    /// Firmware timestamp (MSC_TIMESTAMP), 0.0 if unavailable. May differ
    /// from `timestamp` when events were batched in transit.
    pub msc_timestamp: Stime,
}

impl HardwareState {
    pub fn new(
        timestamp: Stime,
        buttons_down: u32,
        touch_cnt: u16,
        fingers: Vec<FingerState>,
    ) -> Self {
        Self {
            timestamp,
            buttons_down,
            touch_cnt,
            fingers,
            ..Default::default()
        }
    }

    pub fn finger_cnt(&self) -> usize {
        self.fingers.len()
    }

    pub fn finger_by_id(&self, tracking_id: i32) -> Option<&FingerState> {
        self.fingers.iter().find(|f| f.tracking_id == tracking_id)
    }

    pub fn finger_by_id_mut(&mut self, tracking_id: i32) -> Option<&mut FingerState> {
        self.fingers.iter_mut().find(|f| f.tracking_id == tracking_id)
    }

    /// True when both frames track the same set of contacts.
    pub fn same_fingers_as(&self, other: &HardwareState) -> bool {
        self.fingers.len() == other.fingers.len()
            && self
                .fingers
                .iter()
                .all(|f| other.finger_by_id(f.tracking_id).is_some())
    }
}

/// Capabilities of a touchpad or mouse, as probed by the host.
#[derive(Debug, Clone, Copy)]
pub struct HardwareProperties {
    // Reportable coordinate range.
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    /// Resolutions in units/mm; 0 when unknown.
    pub res_x: f64,
    pub res_y: f64,
    pub orientation_minimum: f64,
    pub orientation_maximum: f64,
    /// Most finger slots the device can report in one frame.
    pub max_finger_cnt: u16,
    /// Most contacts the device can detect at once, reported or not.
    pub max_touch_cnt: u16,
    /// "Track 5, Report 2" touchpad: tracks five fingers, reports two.
    pub supports_t5r2: bool,
    /// Semi-multitouch: two fingers reported as one bounding box.
    pub support_semi_mt: bool,
    /// The whole touch surface is clickable (button under the pad).
    pub is_button_pad: bool,
    pub has_wheel: bool,
    pub wheel_is_hi_res: bool,
    /// Reports true pressure (not contact area) and can give haptic
    /// feedback.
    pub is_haptic_pad: bool,
    pub reports_pressure: bool,
}

impl Default for HardwareProperties {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            res_x: 0.0,
            res_y: 0.0,
            orientation_minimum: 0.0,
            orientation_maximum: 0.0,
            max_finger_cnt: 0,
            max_touch_cnt: 0,
            supports_t5r2: false,
            support_semi_mt: false,
            is_button_pad: false,
            has_wheel: false,
            wheel_is_hi_res: false,
            is_haptic_pad: false,
            reports_pressure: true,
        }
    }
}

/// Device class; chooses the filter-chain composition and the curve
/// families the acceleration filter defaults to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Unknown,
    Mouse,
    MultitouchMouse,
    Touchpad,
    Touchscreen,
    PointingStick,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finger(id: i32) -> FingerState {
        FingerState {
            tracking_id: id,
            position_x: 10.0 * id as f64,
            position_y: 5.0,
            pressure: 40.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_finger_lookup() {
        let mut hs = HardwareState::new(1.0, 0, 2, vec![finger(3), finger(7)]);
        assert_eq!(hs.finger_cnt(), 2);
        assert_eq!(hs.finger_by_id(7).unwrap().position_x, 70.0);
        assert!(hs.finger_by_id(8).is_none());

        hs.finger_by_id_mut(3).unwrap().flags |= finger_flags::WARP_X;
        assert!(hs.fingers[0].warp_suppressed());
        assert!(!hs.fingers[1].warp_suppressed());
    }

    #[test]
    fn test_same_fingers_ignores_order() {
        let a = HardwareState::new(1.0, 0, 2, vec![finger(1), finger(2)]);
        let b = HardwareState::new(1.1, 0, 2, vec![finger(2), finger(1)]);
        let c = HardwareState::new(1.2, 0, 1, vec![finger(2)]);
        assert!(a.same_fingers_as(&b));
        assert!(!a.same_fingers_as(&c));
    }

    #[test]
    fn test_warp_masks_cover_move_and_non_move() {
        use finger_flags::*;
        assert_eq!(WARP_X, WARP_X_NON_MOVE | WARP_X_MOVE);
        assert_eq!(WARP_Y, WARP_Y_NON_MOVE | WARP_Y_MOVE);
    }
}
