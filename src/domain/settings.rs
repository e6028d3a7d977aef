use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            console_logging_enabled: default_true(),
            file_logging_enabled: default_false(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "gesture_pipeline".to_string()
}

/// Acceleration-filter knobs. Sensitivities index the curve families;
/// out-scales are applied after the curve ratio, per axis. Custom curves
/// travel as flat real arrays of four values per segment
/// `(x_max, sqr, mul, icept)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccelSettings {
    #[serde(default = "default_sensitivity")]
    pub pointer_sensitivity: i32, // 1..=5
    #[serde(default = "default_sensitivity")]
    pub scroll_sensitivity: i32, // 1..=5
    #[serde(default = "default_true")]
    pub pointer_acceleration: bool,

    // Set per device class: mice pick the mouse pointer curves, and
    // non-touch mice bypass scroll acceleration entirely (their wheel has
    // its own conditioning upstream).
    #[serde(default = "default_false")]
    pub use_mouse_point_curves: bool,
    #[serde(default = "default_false")]
    pub use_mouse_scroll_curves: bool,
    #[serde(default = "default_false")]
    pub use_old_mouse_point_curves: bool,

    #[serde(default = "default_false")]
    pub use_custom_tp_point_curve: bool,
    #[serde(default = "default_false")]
    pub use_custom_tp_scroll_curve: bool,
    #[serde(default = "default_false")]
    pub use_custom_mouse_curve: bool,
    #[serde(default)]
    pub custom_tp_point_curve: Vec<f64>,
    #[serde(default)]
    pub custom_tp_scroll_curve: Vec<f64>,
    #[serde(default)]
    pub custom_mouse_curve: Vec<f64>,

    #[serde(default = "default_unity")]
    pub point_x_out_scale: f64,
    #[serde(default = "default_unity")]
    pub point_y_out_scale: f64,
    #[serde(default = "default_scroll_out_scale")]
    pub scroll_x_out_scale: f64,
    #[serde(default = "default_scroll_out_scale")]
    pub scroll_y_out_scale: f64,

    // Wireless hardware resends packets, so a very long gap can be
    // followed by a very short one that makes the speed look huge. Frame
    // durations outside these bounds are replaced by the last sane one.
    #[serde(default = "default_min_reasonable_dt")]
    pub min_reasonable_dt: f64,
    #[serde(default = "default_max_reasonable_dt")]
    pub max_reasonable_dt: f64,

    #[serde(default = "default_false")]
    pub smooth_accel: bool,
}

impl Default for AccelSettings {
    fn default() -> Self {
        Self {
            pointer_sensitivity: default_sensitivity(),
            scroll_sensitivity: default_sensitivity(),
            pointer_acceleration: true,
            use_mouse_point_curves: false,
            use_mouse_scroll_curves: false,
            use_old_mouse_point_curves: false,
            use_custom_tp_point_curve: false,
            use_custom_tp_scroll_curve: false,
            use_custom_mouse_curve: false,
            custom_tp_point_curve: Vec::new(),
            custom_tp_scroll_curve: Vec::new(),
            custom_mouse_curve: Vec::new(),
            point_x_out_scale: default_unity(),
            point_y_out_scale: default_unity(),
            scroll_x_out_scale: default_scroll_out_scale(),
            scroll_y_out_scale: default_scroll_out_scale(),
            min_reasonable_dt: default_min_reasonable_dt(),
            max_reasonable_dt: default_max_reasonable_dt(),
            smooth_accel: false,
        }
    }
}

fn default_sensitivity() -> i32 {
    3
}
fn default_unity() -> f64 {
    1.0
}
fn default_scroll_out_scale() -> f64 {
    // Keeps a history-navigation overscroll reachable within about an inch
    // of finger travel on common screens.
    2.5
}
fn default_min_reasonable_dt() -> f64 {
    0.003
}
fn default_max_reasonable_dt() -> f64 {
    0.050
}

/// Click-wiggle suppressor knobs. Distances are mm, times are seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickWiggleSettings {
    /// Motion larger than this around a click is allowed through.
    #[serde(default = "default_wiggle_max_dist")]
    pub wiggle_max_dist: f64,
    /// Suppression window after the button is released.
    #[serde(default = "default_wiggle_suppress_timeout")]
    pub wiggle_suppress_timeout: f64,
    /// Suppression window while the button is held.
    #[serde(default = "default_wiggle_button_down_timeout")]
    pub wiggle_button_down_timeout: f64,
    /// Window blocking single-finger movement after a single finger
    /// presses the physical button.
    #[serde(default = "default_one_finger_click_wiggle_timeout")]
    pub one_finger_click_wiggle_timeout: f64,
}

impl Default for ClickWiggleSettings {
    fn default() -> Self {
        Self {
            wiggle_max_dist: default_wiggle_max_dist(),
            wiggle_suppress_timeout: default_wiggle_suppress_timeout(),
            wiggle_button_down_timeout: default_wiggle_button_down_timeout(),
            one_finger_click_wiggle_timeout: default_one_finger_click_wiggle_timeout(),
        }
    }
}

fn default_wiggle_max_dist() -> f64 {
    5.0
}
fn default_wiggle_suppress_timeout() -> f64 {
    0.075
}
fn default_wiggle_button_down_timeout() -> f64 {
    0.75
}
fn default_one_finger_click_wiggle_timeout() -> f64 {
    0.2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub accel: AccelSettings,
    #[serde(default)]
    pub click_wiggle: ClickWiggleSettings,
    #[serde(default)]
    pub log_settings: LogSettings,
}

/// A value crossing the dynamic property surface.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Int(i32),
    Real(f64),
    RealArray(Vec<f64>),
}

impl PropValue {
    fn as_bool(&self, name: &str) -> Result<bool, ConfigError> {
        match self {
            PropValue::Bool(b) => Ok(*b),
            _ => Err(ConfigError::WrongType(name.to_string())),
        }
    }

    fn as_int(&self, name: &str) -> Result<i32, ConfigError> {
        match self {
            PropValue::Int(i) => Ok(*i),
            _ => Err(ConfigError::WrongType(name.to_string())),
        }
    }

    fn as_real(&self, name: &str) -> Result<f64, ConfigError> {
        match self {
            PropValue::Real(r) => Ok(*r),
            _ => Err(ConfigError::WrongType(name.to_string())),
        }
    }

    fn as_real_array(&self, name: &str) -> Result<&[f64], ConfigError> {
        match self {
            PropValue::RealArray(v) => Ok(v),
            _ => Err(ConfigError::WrongType(name.to_string())),
        }
    }
}

/// A flat curve must hold whole segments with non-decreasing bounds,
/// otherwise the in-order segment scan would shadow later pieces.
fn validate_curve(flat: &[f64]) -> Result<(), ConfigError> {
    if flat.len() % 4 != 0 {
        return Err(ConfigError::BadCurveLength(flat.len()));
    }
    let mut prev = f64::NEG_INFINITY;
    for seg in flat.chunks_exact(4) {
        if seg[0] < prev {
            return Err(ConfigError::NonMonotonicCurve);
        }
        prev = seg[0];
    }
    Ok(())
}

fn clamp_sensitivity(name: &str, value: i32) -> i32 {
    let clamped = value.clamp(1, 5);
    if clamped != value {
        warn!("{} {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

impl Settings {
    /// Apply one named value. Sensitivities are clamped to their valid
    /// range; malformed curves are rejected and the old curve kept.
    pub fn apply(&mut self, name: &str, value: PropValue) -> Result<(), ConfigError> {
        let accel = &mut self.accel;
        let wiggle = &mut self.click_wiggle;
        match name {
            "pointer_sensitivity" => {
                accel.pointer_sensitivity = clamp_sensitivity(name, value.as_int(name)?);
            }
            "scroll_sensitivity" => {
                accel.scroll_sensitivity = clamp_sensitivity(name, value.as_int(name)?);
            }
            "pointer_acceleration" => accel.pointer_acceleration = value.as_bool(name)?,
            "use_mouse_point_curves" => accel.use_mouse_point_curves = value.as_bool(name)?,
            "use_mouse_scroll_curves" => accel.use_mouse_scroll_curves = value.as_bool(name)?,
            "use_old_mouse_point_curves" => {
                accel.use_old_mouse_point_curves = value.as_bool(name)?
            }
            "use_custom_tp_point_curve" => accel.use_custom_tp_point_curve = value.as_bool(name)?,
            "use_custom_tp_scroll_curve" => {
                accel.use_custom_tp_scroll_curve = value.as_bool(name)?
            }
            "use_custom_mouse_curve" => accel.use_custom_mouse_curve = value.as_bool(name)?,
            "custom_tp_point_curve" => {
                let flat = value.as_real_array(name)?;
                validate_curve(flat)?;
                accel.custom_tp_point_curve = flat.to_vec();
            }
            "custom_tp_scroll_curve" => {
                let flat = value.as_real_array(name)?;
                validate_curve(flat)?;
                accel.custom_tp_scroll_curve = flat.to_vec();
            }
            "custom_mouse_curve" => {
                let flat = value.as_real_array(name)?;
                validate_curve(flat)?;
                accel.custom_mouse_curve = flat.to_vec();
            }
            "point_x_out_scale" => accel.point_x_out_scale = value.as_real(name)?,
            "point_y_out_scale" => accel.point_y_out_scale = value.as_real(name)?,
            "scroll_x_out_scale" => accel.scroll_x_out_scale = value.as_real(name)?,
            "scroll_y_out_scale" => accel.scroll_y_out_scale = value.as_real(name)?,
            "min_reasonable_dt" => accel.min_reasonable_dt = value.as_real(name)?,
            "max_reasonable_dt" => accel.max_reasonable_dt = value.as_real(name)?,
            "smooth_accel" => accel.smooth_accel = value.as_bool(name)?,
            "wiggle_max_dist" => wiggle.wiggle_max_dist = value.as_real(name)?,
            "wiggle_suppress_timeout" => wiggle.wiggle_suppress_timeout = value.as_real(name)?,
            "wiggle_button_down_timeout" => {
                wiggle.wiggle_button_down_timeout = value.as_real(name)?
            }
            "one_finger_click_wiggle_timeout" => {
                wiggle.one_finger_click_wiggle_timeout = value.as_real(name)?
            }
            _ => return Err(ConfigError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }

    /// Read one named value back, or `None` for an unknown name.
    pub fn fetch(&self, name: &str) -> Option<PropValue> {
        let accel = &self.accel;
        let wiggle = &self.click_wiggle;
        let value = match name {
            "pointer_sensitivity" => PropValue::Int(accel.pointer_sensitivity),
            "scroll_sensitivity" => PropValue::Int(accel.scroll_sensitivity),
            "pointer_acceleration" => PropValue::Bool(accel.pointer_acceleration),
            "use_mouse_point_curves" => PropValue::Bool(accel.use_mouse_point_curves),
            "use_mouse_scroll_curves" => PropValue::Bool(accel.use_mouse_scroll_curves),
            "use_old_mouse_point_curves" => PropValue::Bool(accel.use_old_mouse_point_curves),
            "use_custom_tp_point_curve" => PropValue::Bool(accel.use_custom_tp_point_curve),
            "use_custom_tp_scroll_curve" => PropValue::Bool(accel.use_custom_tp_scroll_curve),
            "use_custom_mouse_curve" => PropValue::Bool(accel.use_custom_mouse_curve),
            "custom_tp_point_curve" => PropValue::RealArray(accel.custom_tp_point_curve.clone()),
            "custom_tp_scroll_curve" => PropValue::RealArray(accel.custom_tp_scroll_curve.clone()),
            "custom_mouse_curve" => PropValue::RealArray(accel.custom_mouse_curve.clone()),
            "point_x_out_scale" => PropValue::Real(accel.point_x_out_scale),
            "point_y_out_scale" => PropValue::Real(accel.point_y_out_scale),
            "scroll_x_out_scale" => PropValue::Real(accel.scroll_x_out_scale),
            "scroll_y_out_scale" => PropValue::Real(accel.scroll_y_out_scale),
            "min_reasonable_dt" => PropValue::Real(accel.min_reasonable_dt),
            "max_reasonable_dt" => PropValue::Real(accel.max_reasonable_dt),
            "smooth_accel" => PropValue::Bool(accel.smooth_accel),
            "wiggle_max_dist" => PropValue::Real(wiggle.wiggle_max_dist),
            "wiggle_suppress_timeout" => PropValue::Real(wiggle.wiggle_suppress_timeout),
            "wiggle_button_down_timeout" => PropValue::Real(wiggle.wiggle_button_down_timeout),
            "one_finger_click_wiggle_timeout" => {
                PropValue::Real(wiggle.one_finger_click_wiggle_timeout)
            }
            _ => return None,
        };
        Some(value)
    }
}

pub struct SettingsService {
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path: Some(settings_path),
        })
    }

    /// A service that never touches the filesystem; for embedding hosts
    /// that manage configuration themselves.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            settings,
            settings_path: None,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("GesturePipeline");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.settings_path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
