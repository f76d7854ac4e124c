//! Error types for govdrop computations

use crate::decimal::{Dec, ParseDecError};
use thiserror::Error;

/// Result type alias for govdrop operations
pub type Result<T> = std::result::Result<T, GovdropError>;

/// Errors raised by the tally and distribution engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovdropError {
    // === Snapshot Records ===
    /// Malformed snapshot record
    #[error("Invalid input for {address:?}: {reason}")]
    InvalidInput { address: String, reason: String },

    /// Unparseable decimal literal
    #[error(transparent)]
    Parse(#[from] ParseDecError),

    // === Parameters ===
    /// Distribution parameters outside their domain
    #[error("Invalid distribution parameters: {0}")]
    InvalidParameters(String),

    // === Calibration ===
    /// Abstain and non-voter pools are both empty
    #[error("Degenerate calibration: abstain and non-voter pools are empty")]
    DegenerateCalibration,

    /// Weighted voter buckets alone exceed the supply to conserve
    #[error("Negative calibration: non-voters multiplier solved to {multiplier}")]
    NegativeCalibration { multiplier: Dec },
}

impl GovdropError {
    pub fn invalid_input(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Get the numeric error code
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidInput { .. } => 2001,
            Self::Parse(_) => 2002,
            Self::InvalidParameters(_) => 2101,
            Self::DegenerateCalibration => 3001,
            Self::NegativeCalibration { .. } => 3002,
        }
    }

    /// Calibration failures depend on the parameter set, so a sweep may
    /// report them and move on to the next combination
    pub fn is_calibration_failure(&self) -> bool {
        matches!(
            self,
            Self::DegenerateCalibration | Self::NegativeCalibration { .. }
        )
    }

    /// Offending address, if the error is tied to one record
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::InvalidInput { address, .. } => Some(address),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GovdropError::invalid_input("a", "b").code(), 2001);
        assert_eq!(GovdropError::DegenerateCalibration.code(), 3001);
        assert_eq!(
            GovdropError::InvalidParameters("malus".into()).code(),
            2101
        );
    }

    #[test]
    fn test_error_display() {
        let err = GovdropError::invalid_input("cosmos1xyz", "negative liquid amount");
        let msg = format!("{}", err);
        assert!(msg.contains("cosmos1xyz"));
        assert!(msg.contains("negative liquid amount"));
        assert_eq!(err.address(), Some("cosmos1xyz"));
    }

    #[test]
    fn test_calibration_failures() {
        assert!(GovdropError::DegenerateCalibration.is_calibration_failure());
        assert!(GovdropError::NegativeCalibration {
            multiplier: Dec::from_int(-1)
        }
        .is_calibration_failure());
        assert!(!GovdropError::InvalidParameters("x".into()).is_calibration_failure());
    }

    #[test]
    fn test_parse_error_converts() {
        let err: GovdropError = "x".parse::<Dec>().unwrap_err().into();
        assert!(matches!(err, GovdropError::Parse(_)));
    }
}
