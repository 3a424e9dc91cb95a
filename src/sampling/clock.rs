use std::time::Instant;

/// Monotonic microsecond counter used to pace sampling
///
/// The counter is free-running and wraps at `u32::MAX`; callers compare
/// readings with `wrapping_sub`, never with `<` on absolute values.
pub trait MicrosClock: Send + Sync {
    fn micros(&self) -> u32;
}

/// Clock backed by `Instant`, truncated to a wrapping `u32`
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MicrosClock for SystemClock {
    fn micros(&self) -> u32 {
        // Truncation is the wraparound.
        self.origin.elapsed().as_micros() as u32
    }
}
