// Error types for the tone drive controller
//
// This module defines the error taxonomy for configuration and startup
// failures, with stable numeric codes for diagnostics output.

mod control;

pub use control::{log_control_error, ControlError, ControlErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting from the CLI
/// and the telemetry stream.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
