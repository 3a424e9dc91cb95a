use std::sync::atomic::{AtomicU32, Ordering};

use crate::sampling::MicrosClock;

/// Microsecond counter that advances by a fixed step on every read
///
/// Busy-wait loops poll the clock, so each poll moves virtual time forward
/// and sampling finishes instantly in real time. The counter wraps like the
/// hardware one.
pub struct VirtualClock {
    now: AtomicU32,
    step_us: u32,
}

impl VirtualClock {
    pub fn new(start_us: u32, step_us: u32) -> Self {
        Self {
            now: AtomicU32::new(start_us),
            step_us,
        }
    }

    /// Current time without advancing
    pub fn peek(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }

    /// Jump forward, e.g. to model processing time between cycles
    pub fn advance(&self, us: u32) {
        self.now.fetch_add(us, Ordering::SeqCst);
    }
}

impl MicrosClock for VirtualClock {
    fn micros(&self) -> u32 {
        // fetch_add wraps on overflow
        self.now.fetch_add(self.step_us, Ordering::SeqCst)
    }
}
