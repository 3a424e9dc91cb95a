//! Sampler - fixed-rate acquisition of one analysis buffer
//!
//! The sampler reads the analog input exactly N times, one read per
//! sampling period. Deadlines advance additively from the first read
//! (`deadline += period`) instead of being recomputed from "now", so a
//! late sample never pushes every following sample back. Clock arithmetic
//! uses wrapping `u32` microseconds, matching a free-running hardware
//! counter that rolls over roughly every 71 minutes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SamplingConfig;

mod clock;

pub use clock::{MicrosClock, SystemClock};

/// Single-ended analog input channel
///
/// A read always yields a value; there is no failure path.
pub trait AnalogInput: Send {
    fn read(&mut self) -> u16;
}

/// How the sampler waits for the next sample deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Poll the clock until the deadline passes
    #[default]
    Spin,
    /// Sleep for the remaining time, then poll to finish
    Sleep,
}

/// One cycle's worth of samples, earliest first
///
/// `imag` mirrors `real` in length and starts zeroed; it exists so the
/// buffer can be handed to a complex transform as a real/imaginary pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    real: Vec<f32>,
    imag: Vec<f32>,
}

impl SampleBuffer {
    /// Build a buffer from real samples with a zeroed imaginary part
    pub fn from_real(real: Vec<f32>) -> Self {
        let imag = vec![0.0; real.len()];
        Self { real, imag }
    }

    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub fn real(&self) -> &[f32] {
        &self.real
    }

    pub fn imag(&self) -> &[f32] {
        &self.imag
    }
}

/// Acquires N samples at a fixed period against a monotonic clock
#[derive(Debug, Clone)]
pub struct Sampler {
    sample_count: usize,
    period_us: u32,
    wait: WaitStrategy,
}

impl Sampler {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            sample_count: config.sample_count,
            period_us: config.sampling_period_us(),
            wait: config.wait,
        }
    }

    /// Sample the input exactly N times
    ///
    /// Each read is followed by a wait until `period` has elapsed since the
    /// previous deadline; the deadline then advances by exactly one period.
    pub fn acquire(&self, input: &mut dyn AnalogInput, clock: &dyn MicrosClock) -> SampleBuffer {
        let mut real = Vec::with_capacity(self.sample_count);
        let mut deadline_base = clock.micros();

        for _ in 0..self.sample_count {
            real.push(input.read() as f32);
            self.wait_for(clock, deadline_base);
            deadline_base = deadline_base.wrapping_add(self.period_us);
        }

        SampleBuffer::from_real(real)
    }

    fn wait_for(&self, clock: &dyn MicrosClock, base: u32) {
        loop {
            let elapsed = clock.micros().wrapping_sub(base);
            if elapsed >= self.period_us {
                return;
            }
            match self.wait {
                WaitStrategy::Spin => std::hint::spin_loop(),
                WaitStrategy::Sleep => {
                    std::thread::sleep(Duration::from_micros(u64::from(self.period_us - elapsed)))
                }
            }
        }
    }
}
