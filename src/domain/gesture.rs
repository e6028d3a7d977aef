//! High-level pointer events produced by the filter chain.
//!
//! Scroll and fling axes use inverted signs compared to move: a positive
//! move dx is rightward cursor motion, while a positive scroll dx means the
//! fingers moved *left* (unless an inverted-scrolling preference flips it
//! upstream). The `ordinal_*` fields always carry the pre-acceleration
//! values so clients that need motion proportional to the physical gesture
//! (history navigation, overscroll) can use them.

use super::hardware::Stime;

/// Phase of a fling: `Start` when the fingers leave the pad with momentum,
/// `TapDown` when a new contact lands and the fling must stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlingState {
    Start,
    TapDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomState {
    Start,
    Update,
    End,
}

/// Metrics events the engine surfaces to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsKind {
    NoisyGround,
    MouseMovement,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureKind {
    Move {
        dx: f64,
        dy: f64,
        ordinal_dx: f64,
        ordinal_dy: f64,
    },
    Scroll {
        dx: f64,
        dy: f64,
        ordinal_dx: f64,
        ordinal_dy: f64,
        /// When set, a filter that rounds this scroll down to nothing must
        /// still emit a `Fling(TapDown)` so an ongoing fling stops.
        stop_fling: bool,
    },
    MouseWheel {
        dx: f64,
        dy: f64,
        /// Raw wheel travel; 120 per full detent.
        tick_120ths_dx: i32,
        tick_120ths_dy: i32,
    },
    ButtonsChange {
        /// Bits set in both masks mean press-then-release within one frame;
        /// the client processes `down` first.
        down: u32,
        up: u32,
        is_tap: bool,
    },
    Fling {
        vx: f64,
        vy: f64,
        ordinal_vx: f64,
        ordinal_vy: f64,
        state: FlingState,
    },
    Swipe {
        dx: f64,
        dy: f64,
        ordinal_dx: f64,
        ordinal_dy: f64,
    },
    SwipeLift,
    FourFingerSwipe {
        dx: f64,
        dy: f64,
        ordinal_dx: f64,
        ordinal_dy: f64,
    },
    FourFingerSwipeLift,
    Pinch {
        /// Relative pinch factor, 1.0 = no pinch, <1.0 outwards.
        dz: f64,
        ordinal_dz: f64,
        state: ZoomState,
    },
    Metrics {
        kind: MetricsKind,
        data: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub start_time: Stime,
    pub end_time: Stime,
    pub kind: GestureKind,
}

/// Constructors seed the ordinal fields from the raw deltas; filters then
/// scale the accelerated fields independently.
impl Gesture {
    pub fn pointer_move(start_time: Stime, end_time: Stime, dx: f64, dy: f64) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::Move {
                dx,
                dy,
                ordinal_dx: dx,
                ordinal_dy: dy,
            },
        }
    }

    pub fn scroll(start_time: Stime, end_time: Stime, dx: f64, dy: f64) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::Scroll {
                dx,
                dy,
                ordinal_dx: dx,
                ordinal_dy: dy,
                stop_fling: false,
            },
        }
    }

    pub fn mouse_wheel(
        start_time: Stime,
        end_time: Stime,
        dx: f64,
        dy: f64,
        tick_120ths_dx: i32,
        tick_120ths_dy: i32,
    ) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::MouseWheel {
                dx,
                dy,
                tick_120ths_dx,
                tick_120ths_dy,
            },
        }
    }

    pub fn buttons_change(
        start_time: Stime,
        end_time: Stime,
        down: u32,
        up: u32,
        is_tap: bool,
    ) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::ButtonsChange { down, up, is_tap },
        }
    }

    pub fn fling(start_time: Stime, end_time: Stime, vx: f64, vy: f64, state: FlingState) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::Fling {
                vx,
                vy,
                ordinal_vx: vx,
                ordinal_vy: vy,
                state,
            },
        }
    }

    pub fn swipe(start_time: Stime, end_time: Stime, dx: f64, dy: f64) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::Swipe {
                dx,
                dy,
                ordinal_dx: dx,
                ordinal_dy: dy,
            },
        }
    }

    pub fn four_finger_swipe(start_time: Stime, end_time: Stime, dx: f64, dy: f64) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::FourFingerSwipe {
                dx,
                dy,
                ordinal_dx: dx,
                ordinal_dy: dy,
            },
        }
    }

    pub fn pinch(start_time: Stime, end_time: Stime, dz: f64, state: ZoomState) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::Pinch {
                dz,
                ordinal_dz: dz,
                state,
            },
        }
    }

    pub fn swipe_lift(start_time: Stime, end_time: Stime) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::SwipeLift,
        }
    }

    pub fn four_finger_swipe_lift(start_time: Stime, end_time: Stime) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::FourFingerSwipeLift,
        }
    }

    pub fn metrics(
        start_time: Stime,
        end_time: Stime,
        kind: MetricsKind,
        d0: f64,
        d1: f64,
    ) -> Self {
        Self {
            start_time,
            end_time,
            kind: GestureKind::Metrics {
                kind,
                data: [d0, d1],
            },
        }
    }
}
