//! Error types
//!
//! Nothing on the per-frame path returns these: evaluation substitutes
//! defaults instead. They surface at start-up (program registration) and
//! when loading preset files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while registering material programs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialError {
    #[error("Failed to parse program for material '{type_name}': {message}")]
    ShaderParseFailed { type_name: String, message: String },
    #[error("Program for material '{type_name}' failed validation: {message}")]
    ShaderValidationFailed { type_name: String, message: String },
    #[error("Material '{type_name}' declares uniform '{uniform}' without a default value")]
    MissingDefault { type_name: String, uniform: String },
    #[error("Default for uniform '{uniform}' of material '{type_name}' is {found:?}, program expects {expected:?}")]
    KindMismatch {
        type_name: String,
        uniform: String,
        expected: crate::value::UniformKind,
        found: crate::value::UniformKind,
    },
    #[error("Material '{type_name}' has a default for '{uniform}' which its program does not declare")]
    UnknownDefault { type_name: String, uniform: String },
    #[error("Failed to register built-in materials: {0}")]
    InitializationFailed(#[source] Box<MaterialError>),
}

pub type MaterialResult<T> = Result<T, MaterialError>;

/// Errors raised by a sampled property source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("Sampled property has no samples")]
    NoSamples,
    #[error("Time {time} is outside the sampled range [{start}, {stop}]")]
    OutOfRange { time: f64, start: f64, stop: f64 },
    #[error("Cannot sample at non-finite time {0}")]
    InvalidTime(f64),
    #[error("Callback failed: {0}")]
    Callback(String),
}

/// Errors raised while loading a material preset file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse material presets: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::UniformKind;

    #[test]
    fn test_error_display() {
        let err = MaterialError::MissingDefault {
            type_name: "Water".into(),
            uniform: "frequency".into(),
        };
        assert_eq!(
            err.to_string(),
            "Material 'Water' declares uniform 'frequency' without a default value"
        );

        let err = MaterialError::KindMismatch {
            type_name: "Water".into(),
            uniform: "amplitude".into(),
            expected: UniformKind::Float,
            found: UniformKind::Vec4,
        };
        assert!(err.to_string().contains("expects Float"));

        let err = PropertyError::OutOfRange {
            time: 5.0,
            start: 0.0,
            stop: 1.0,
        };
        assert_eq!(err.to_string(), "Time 5 is outside the sampled range [0, 1]");
    }

    #[test]
    fn test_init_failure_keeps_cause() {
        use std::error::Error as _;

        let cause = MaterialError::UnknownDefault {
            type_name: "Water".into(),
            uniform: "ripples".into(),
        };
        let err = MaterialError::InitializationFailed(Box::new(cause.clone()));

        assert!(matches!(
            &err,
            MaterialError::InitializationFailed(inner)
                if matches!(**inner, MaterialError::UnknownDefault { .. })
        ));
        assert_eq!(err.source().map(|e| e.to_string()), Some(cause.to_string()));
    }
}
