//! Error handling for Cadenza
//!
//! Parameter validation errors are descriptive and surface immediately to the
//! caller of the single effect involved. The chain executor never converts a
//! misconfigured stage into a hard failure; see `Engine::apply_chain`.

use thiserror::Error;

/// Result type alias for Cadenza operations
pub type Result<T> = std::result::Result<T, CadenzaError>;

/// Main error type for Cadenza operations
#[derive(Error, Debug)]
pub enum CadenzaError {
    #[error("Invalid parameter '{param}': got {value}, expected {expected}")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Invalid sample rate: {sample_rate} Hz (must be positive)")]
    InvalidSampleRate { sample_rate: u32 },

    #[error("Cutoff frequency {cutoff_hz} Hz is outside (0, {nyquist}) Hz")]
    CutoffOutOfRange { cutoff_hz: f32, nyquist: f32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CadenzaError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            CadenzaError::InvalidParameter { .. } => "INVALID_PARAMETER",
            CadenzaError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            CadenzaError::CutoffOutOfRange { .. } => "CUTOFF_OUT_OF_RANGE",
            CadenzaError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Build an `InvalidParameter` error from anything displayable
pub(crate) fn invalid_param(
    param: &str,
    value: impl std::fmt::Display,
    expected: impl Into<String>,
) -> CadenzaError {
    CadenzaError::InvalidParameter {
        param: param.to_string(),
        value: value.to_string(),
        expected: expected.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = invalid_param("ratio", 0.5, "1.0 to 20.0");
        assert_eq!(err.error_code(), "INVALID_PARAMETER");

        let err = CadenzaError::InvalidSampleRate { sample_rate: 0 };
        assert_eq!(err.error_code(), "INVALID_SAMPLE_RATE");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = invalid_param("cutoff_hz", -100.0, "0 to 22050 Hz");
        let msg = err.to_string();
        assert!(msg.contains("cutoff_hz"));
        assert!(msg.contains("-100"));
        assert!(msg.contains("22050"));
    }
}
