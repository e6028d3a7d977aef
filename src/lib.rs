//! Gesture conditioning for pointing devices.
//!
//! This crate sits between a raw pointing device (touchpad, touch mouse,
//! pointing stick, wheel mouse) and a compositor. It takes per-frame
//! hardware snapshots plus the primitive gestures a recognizer derives
//! from them, and delivers conditioned pointer events: accelerated moves
//! and scrolls, whole-pixel scroll deltas, flings, and clean clicks with
//! the button-press wobble filtered out.
//!
//! The engine is a linear chain of filters, each owning the stage beneath
//! it:
//!
//! ```text
//! client <- Logging <- Integral <- Accel <- ClickWiggle <- recognizer <- device
//! ```
//!
//! Everything runs synchronously on the host's thread. A filter never
//! blocks; the only deferred work is a timeout the host is asked to
//! deliver later via [`GesturePipeline::timer_fired`].
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use gesture_pipeline::{
//!     DeviceClass, GesturePipeline, HardwareProperties, SettingsService,
//! };
//!
//! # fn recognizer() -> Box<dyn gesture_pipeline::Filter> { unimplemented!() }
//! let settings = Arc::new(Mutex::new(SettingsService::new().unwrap()));
//! let mut pipeline = GesturePipeline::new(
//!     DeviceClass::Touchpad,
//!     &HardwareProperties::default(),
//!     settings,
//!     recognizer(),
//! );
//! pipeline.set_callback(Box::new(|gesture| println!("{:?}", gesture)));
//! ```

pub mod domain;
pub mod error;
pub mod filters;
pub mod infrastructure;
pub mod pipeline;

pub use domain::curve::CurveSegment;
pub use domain::gesture::{FlingState, Gesture, GestureKind, MetricsKind, ZoomState};
pub use domain::hardware::{
    buttons, finger_flags, DeviceClass, FingerState, HardwareProperties, HardwareState, Stime,
    ToolType,
};
pub use domain::settings::{
    AccelSettings, ClickWiggleSettings, LogSettings, PropValue, Settings, SettingsService,
};
pub use error::ConfigError;
pub use filters::{AccelFilter, ClickWiggleFilter, Filter, IntegralFilter, LoggingFilter};
pub use pipeline::{GestureCallback, GesturePipeline};
