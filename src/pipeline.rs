//! Chain assembly and the host-facing surface.
//!
//! The pipeline owns the whole filter chain, built bottom-up over a
//! host-supplied source (the gesture recognizer for the device). Frames go
//! in, conditioned gestures come out through a single callback, and the
//! only deferred work is the optional timeout handed back to the host.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::domain::gesture::Gesture;
use crate::domain::hardware::{DeviceClass, HardwareProperties, HardwareState, Stime};
use crate::domain::settings::SettingsService;
use crate::filters::{AccelFilter, ClickWiggleFilter, Filter, IntegralFilter, LoggingFilter};

pub type GestureCallback = Box<dyn FnMut(&Gesture)>;

pub struct GesturePipeline {
    top: Box<dyn Filter>,
    callback: Option<GestureCallback>,
    scratch: Vec<Gesture>,
}

impl GesturePipeline {
    /// Build the chain for one device. `source` is the recognizer sitting
    /// at the bottom; everything above it is chosen by device class:
    ///
    /// - touchpads and touchscreens get the full conditioning stack, with
    ///   click-wiggle suppression when the surface itself clicks;
    /// - mice skip the touch-only stages, and non-touch mice bypass
    ///   scroll acceleration (their wheel is conditioned upstream).
    pub fn new(
        device_class: DeviceClass,
        hwprops: &HardwareProperties,
        settings: Arc<Mutex<SettingsService>>,
        source: Box<dyn Filter>,
    ) -> Self {
        {
            let mut service = settings.lock().unwrap();
            let accel = &mut service.get_mut().accel;
            match device_class {
                DeviceClass::Mouse | DeviceClass::PointingStick => {
                    accel.use_mouse_point_curves = true;
                    accel.use_mouse_scroll_curves = true;
                }
                DeviceClass::MultitouchMouse => {
                    accel.use_mouse_point_curves = true;
                    accel.use_mouse_scroll_curves = false;
                }
                DeviceClass::Touchpad | DeviceClass::Touchscreen | DeviceClass::Unknown => {
                    accel.use_mouse_point_curves = false;
                    accel.use_mouse_scroll_curves = false;
                }
            }
        }

        let wants_click_wiggle = hwprops.is_button_pad
            && matches!(
                device_class,
                DeviceClass::Touchpad | DeviceClass::Touchscreen
            );

        let mut chain: Box<dyn Filter> = source;
        if wants_click_wiggle {
            chain = Box::new(ClickWiggleFilter::new(settings.clone(), chain));
        }
        chain = Box::new(AccelFilter::new(settings.clone(), chain));
        chain = Box::new(IntegralFilter::new(chain));
        chain = Box::new(LoggingFilter::new(chain));

        info!(
            ?device_class,
            click_wiggle = wants_click_wiggle,
            "gesture pipeline assembled"
        );

        Self {
            top: chain,
            callback: None,
            scratch: Vec::new(),
        }
    }

    /// Install the gesture delivery callback. Gestures produced before a
    /// callback is set are discarded.
    pub fn set_callback(&mut self, callback: GestureCallback) {
        self.callback = Some(callback);
    }

    /// Feed one hardware frame through the chain. Every gesture produced
    /// is delivered before this returns; the result is the delay after
    /// which `timer_fired` wants to be called, if any.
    pub fn push_frame(&mut self, frame: &mut HardwareState) -> Option<Stime> {
        let timeout = self.top.push_frame(frame, &mut self.scratch);
        self.deliver();
        timeout
    }

    /// A previously requested timeout elapsed.
    pub fn timer_fired(&mut self, now: Stime) -> Option<Stime> {
        let timeout = self.top.timer_fired(now, &mut self.scratch);
        self.deliver();
        timeout
    }

    fn deliver(&mut self) {
        if let Some(callback) = &mut self.callback {
            for gesture in self.scratch.drain(..) {
                callback(&gesture);
            }
        } else {
            self.scratch.clear();
        }
    }
}
