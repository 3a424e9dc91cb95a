//! Startup checks and the fatal halt path.

use crate::error::{log_control_error, ControlError};
use crate::telemetry::{LifecyclePhase, TelemetryHub};

/// Hardware that must answer before the loop may start (e.g. the RTC)
pub trait Peripheral {
    fn name(&self) -> &str;

    /// Probe the device; called once at startup
    fn is_present(&mut self) -> bool;
}

/// Probe every peripheral in order and fail on the first absent one
pub fn preflight(peripherals: &mut [&mut dyn Peripheral]) -> Result<(), ControlError> {
    for peripheral in peripherals.iter_mut() {
        if !peripheral.is_present() {
            return Err(ControlError::PeripheralMissing {
                peripheral: peripheral.name().to_string(),
            });
        }
        log::debug!("[Preflight] {} present", peripheral.name());
    }
    Ok(())
}

/// Report a fatal error once and block the calling thread forever.
///
/// The error log line is the only diagnostic; callers must not print their
/// own. The process stays alive in a halted state and nothing is retried.
pub fn halt(err: &ControlError, telemetry: &TelemetryHub) -> ! {
    enter_halt(err, telemetry);
    loop {
        std::thread::park();
    }
}

fn enter_halt(err: &ControlError, telemetry: &TelemetryHub) {
    log_control_error(err, "halt");
    telemetry.record_phase(LifecyclePhase::Halted);
}
