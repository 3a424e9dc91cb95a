// Control error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Control error code constants
///
/// Single source of truth for the numeric codes reported on stderr and
/// in telemetry error events.
///
/// Error code range: 3001-3002
pub struct ControlErrorCodes {}

impl ControlErrorCodes {
    /// Configuration failed validation
    pub const INVALID_CONFIG: i32 = 3001;

    /// A peripheral required at startup did not respond
    pub const PERIPHERAL_MISSING: i32 = 3002;
}

/// Log a control error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_control_error(err: &ControlError, context: &str) {
    error!(
        "Control error in {}: code={}, component=ControlLoop, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while configuring or starting the control loop
///
/// The per-cycle path itself has no failure mode: out-of-band peaks are
/// suppressed by classification, not reported.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    /// Configuration is inconsistent (bands overlap, N not a power of two)
    InvalidConfig { reason: String },

    /// Required peripheral absent at startup; the controller must halt
    PeripheralMissing { peripheral: String },
}

impl ErrorCode for ControlError {
    fn code(&self) -> i32 {
        match self {
            ControlError::InvalidConfig { .. } => ControlErrorCodes::INVALID_CONFIG,
            ControlError::PeripheralMissing { .. } => ControlErrorCodes::PERIPHERAL_MISSING,
        }
    }

    fn message(&self) -> String {
        match self {
            ControlError::InvalidConfig { reason } => {
                format!("Invalid configuration: {}", reason)
            }
            ControlError::PeripheralMissing { peripheral } => {
                format!("Couldn't find {}", peripheral)
            }
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ControlError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ControlError {}
