//! Deterministic stand-ins for the hardware collaborators.
//!
//! The real inputs are an ADC pin, a free-running microsecond counter and a
//! real-time clock chip. These replacements let the full control loop run
//! on a desktop, in tests and in the CLI simulator, without waiting on
//! wall-clock time.

mod clock;
mod signal;

pub use clock::VirtualClock;
pub use signal::{parse_schedule, ScheduleStep, ScheduledToneInput, ToneGenerator};

use crate::engine::Peripheral;

/// Peripheral whose presence is fixed at construction
pub struct SimulatedPeripheral {
    name: String,
    present: bool,
}

impl SimulatedPeripheral {
    pub fn present(name: &str) -> Self {
        Self {
            name: name.to_string(),
            present: true,
        }
    }

    pub fn missing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            present: false,
        }
    }
}

impl Peripheral for SimulatedPeripheral {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_present(&mut self) -> bool {
        self.present
    }
}
