use thiserror::Error;

/// Rejections from the dynamic configuration surface. All are recoverable:
/// the previous value stays in effect.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    #[error("property `{0}` was given a value of the wrong type")]
    WrongType(String),

    #[error("curve data length {0} is not a multiple of 4")]
    BadCurveLength(usize),

    #[error("curve segment bounds must be non-decreasing")]
    NonMonotonicCurve,
}
