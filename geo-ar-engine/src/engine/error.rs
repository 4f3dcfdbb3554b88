use std::fmt;

/// Reasons a calibration request was skipped. All are recoverable: the
/// controller state is left untouched and the caller may retry on the next fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSkip {
    /// `recalibrate` was called before `initialize` succeeded.
    NotInitialized,
    /// `initialize` was called on an already calibrated controller.
    AlreadyInitialized,
    MissingLocation,
    MissingHeading,
}

impl fmt::Display for CalibrationSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationSkip::NotInitialized => write!(f, "calibration has not been initialised"),
            CalibrationSkip::AlreadyInitialized => write!(f, "calibration is already initialised"),
            CalibrationSkip::MissingLocation => write!(f, "no usable location fix"),
            CalibrationSkip::MissingHeading => write!(f, "no heading fix"),
        }
    }
}

impl std::error::Error for CalibrationSkip {}

/// Configuration loading and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file could not be read.
    Io { path: String, message: String },
    /// JSON could not be parsed into a configuration.
    Parse { message: String },
    /// A parameter is outside its valid range.
    InvalidValue {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "failed to read config {}: {}", path, message)
            }
            ConfigError::Parse { message } => write!(f, "invalid config JSON: {}", message),
            ConfigError::InvalidValue {
                parameter,
                value,
                reason,
            } => write!(f, "invalid value {} for '{}': {}", value, parameter, reason),
        }
    }
}

impl std::error::Error for ConfigError {}
