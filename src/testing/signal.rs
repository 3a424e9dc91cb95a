//! Synthetic tone sources shaped like a 10-bit ADC capture.

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sampling::AnalogInput;

/// Mid-rail bias of a 10-bit converter
const ADC_MIDPOINT: f32 = 512.0;
/// Largest 10-bit reading
const ADC_MAX: f32 = 1023.0;
/// Default tone amplitude in ADC counts
const DEFAULT_AMPLITUDE: f32 = 300.0;

/// Phase-continuous sine generator with optional uniform noise
///
/// A frequency of 0 Hz produces silence: a flat mid-rail level.
pub struct ToneGenerator {
    sample_rate: u32,
    frequency_hz: f32,
    amplitude: f32,
    phase: f32,
    noise_amplitude: f32,
    rng: StdRng,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frequency_hz: 0.0,
            amplitude: DEFAULT_AMPLITUDE,
            phase: 0.0,
            noise_amplitude: 0.0,
            rng: StdRng::seed_from_u64(42),
        }
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Add uniform noise of +/- `amplitude` counts from a seeded generator
    pub fn with_noise(mut self, amplitude: f32, seed: u64) -> Self {
        self.noise_amplitude = amplitude.abs();
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn set_frequency(&mut self, frequency_hz: f32) {
        self.frequency_hz = frequency_hz;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    /// Next quantised reading in `0..=1023`
    pub fn next_sample(&mut self) -> u16 {
        let tone = if self.frequency_hz > 0.0 {
            self.amplitude * self.phase.sin()
        } else {
            0.0
        };
        let noise = if self.noise_amplitude > 0.0 {
            self.rng
                .gen_range(-self.noise_amplitude..=self.noise_amplitude)
        } else {
            0.0
        };

        let step = std::f32::consts::TAU * self.frequency_hz / self.sample_rate as f32;
        self.phase = (self.phase + step) % std::f32::consts::TAU;

        (ADC_MIDPOINT + tone + noise).round().clamp(0.0, ADC_MAX) as u16
    }
}

/// One leg of a tone schedule: play `frequency_hz` for `cycles` buffers
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScheduleStep {
    pub frequency_hz: f32,
    pub cycles: u32,
}

/// Parse `"440:8,0:2,262:8"` into schedule steps (`0` Hz is silence)
pub fn parse_schedule(spec: &str) -> Result<Vec<ScheduleStep>> {
    let steps = spec
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (freq, cycles) = part
                .split_once(':')
                .ok_or_else(|| anyhow!("schedule step '{}' must look like HZ:CYCLES", part))?;
            let frequency_hz: f32 = freq
                .trim()
                .parse()
                .with_context(|| format!("invalid frequency in '{}'", part))?;
            let cycles: u32 = cycles
                .trim()
                .parse()
                .with_context(|| format!("invalid cycle count in '{}'", part))?;
            if frequency_hz < 0.0 || !frequency_hz.is_finite() {
                return Err(anyhow!("frequency in '{}' must be >= 0", part));
            }
            Ok(ScheduleStep {
                frequency_hz,
                cycles,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if steps.is_empty() {
        return Err(anyhow!("schedule '{}' has no steps", spec));
    }
    Ok(steps)
}

/// Analog input that plays a tone schedule, one step per analysis buffer
///
/// Every `samples_per_cycle` reads count as one cycle. After the schedule
/// runs out the input stays silent.
pub struct ScheduledToneInput {
    generator: ToneGenerator,
    schedule: Vec<ScheduleStep>,
    samples_per_cycle: usize,
    reads: u64,
}

impl ScheduledToneInput {
    pub fn new(
        generator: ToneGenerator,
        schedule: Vec<ScheduleStep>,
        samples_per_cycle: usize,
    ) -> Self {
        Self {
            generator,
            schedule,
            samples_per_cycle: samples_per_cycle.max(1),
            reads: 0,
        }
    }

    /// Total cycles covered by the schedule
    pub fn total_cycles(&self) -> u64 {
        self.schedule.iter().map(|step| u64::from(step.cycles)).sum()
    }

    fn frequency_for_cycle(&self, cycle: u64) -> f32 {
        let mut remaining = cycle;
        for step in &self.schedule {
            if remaining < u64::from(step.cycles) {
                return step.frequency_hz;
            }
            remaining -= u64::from(step.cycles);
        }
        0.0
    }
}

impl AnalogInput for ScheduledToneInput {
    fn read(&mut self) -> u16 {
        let cycle = self.reads / self.samples_per_cycle as u64;
        let frequency = self.frequency_for_cycle(cycle);
        if frequency != self.generator.frequency() {
            self.generator.set_frequency(frequency);
        }
        self.reads += 1;
        self.generator.next_sample()
    }
}
