//! ControlLoop: one synchronous sample → analyse → classify → control →
//! actuate cycle, repeated forever.
//!
//! The loop owns its hardware collaborators and the [`ControlState`]. The
//! status board and telemetry hub are shared so a display reader or CLI can
//! observe without touching the loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::actuator::Actuator;
use crate::analysis::{SpectralAnalyzer, Tone, ToneClassifier};
use crate::config::AppConfig;
use crate::control::{ControlState, SpeedController, Transition};
use crate::error::ControlError;
use crate::sampling::{AnalogInput, MicrosClock, Sampler};
use crate::status::StatusBoard;
use crate::telemetry::{LifecyclePhase, TelemetryHub};

use super::preflight::{preflight, Peripheral};

/// Collaborators the loop drives
pub struct Hardware {
    pub input: Box<dyn AnalogInput>,
    pub clock: Arc<dyn MicrosClock>,
    pub actuator: Box<dyn Actuator>,
}

/// Outcome of one control cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// Raw interpolated peak from the analyzer
    pub peak_hz: f32,
    /// Peak after out-of-band suppression (0 when no tone)
    pub suppressed_peak_hz: f32,
    pub tone: Tone,
    /// `None` on the first cycle, when there is no previous peak
    pub stable: Option<bool>,
    pub stability_count: u32,
    pub level: usize,
    pub level_label: String,
    pub duty: u8,
    pub transition: Option<Transition>,
}

pub struct ControlLoop {
    sampler: Sampler,
    analyzer: SpectralAnalyzer,
    classifier: ToneClassifier,
    controller: SpeedController,
    state: ControlState,
    hardware: Hardware,
    status: Arc<StatusBoard>,
    telemetry: Arc<TelemetryHub>,
    cycle: u64,
    inter_cycle_delay: Duration,
    log_every_n_cycles: u64,
}

impl ControlLoop {
    pub fn new(config: &AppConfig, hardware: Hardware) -> Result<Self, ControlError> {
        Self::with_telemetry(config, hardware, Arc::new(TelemetryHub::default()))
    }

    /// Build the loop and apply the configured direction once.
    ///
    /// The configuration is validated first; nothing reaches the actuator
    /// when it is rejected.
    pub fn with_telemetry(
        config: &AppConfig,
        mut hardware: Hardware,
        telemetry: Arc<TelemetryHub>,
    ) -> Result<Self, ControlError> {
        if let Err(err) = config.validate() {
            telemetry.record_error(&err, "config");
            return Err(err);
        }

        let controller = SpeedController::new(&config.controller);
        let direction = config.actuator.direction;
        let state = ControlState::new(direction);
        let status = Arc::new(StatusBoard::new(controller.levels().clone(), direction));

        hardware.actuator.set_direction(direction);
        telemetry.record_phase(LifecyclePhase::DirectionSet);
        status.publish(state.current_level, state.direction, 0);

        log::info!(
            "[ControlLoop] ready: N={} fs={}Hz period={}us levels={} direction={}",
            config.sampling.sample_count,
            config.sampling.sampling_frequency_hz,
            config.sampling.sampling_period_us(),
            controller.levels().len(),
            direction.label()
        );

        Ok(Self {
            sampler: Sampler::new(&config.sampling),
            analyzer: SpectralAnalyzer::new(&config.sampling),
            classifier: ToneClassifier::new(&config.bands),
            controller,
            state,
            hardware,
            status,
            telemetry,
            cycle: 0,
            inter_cycle_delay: Duration::from_millis(config.cycle.inter_cycle_delay_ms),
            log_every_n_cycles: config.cycle.log_every_n_cycles,
        })
    }

    /// Check peripherals, then build the loop
    ///
    /// A missing peripheral is recorded on the telemetry hub and returned;
    /// callers normally hand it to [`super::halt`].
    pub fn start(
        config: &AppConfig,
        hardware: Hardware,
        telemetry: Arc<TelemetryHub>,
        peripherals: &mut [&mut dyn Peripheral],
    ) -> Result<Self, ControlError> {
        if let Err(err) = preflight(peripherals) {
            telemetry.record_error(&err, "preflight");
            return Err(err);
        }
        telemetry.record_phase(LifecyclePhase::PreflightPassed);
        Self::with_telemetry(config, hardware, telemetry)
    }

    pub fn status_board(&self) -> Arc<StatusBoard> {
        Arc::clone(&self.status)
    }

    pub fn telemetry(&self) -> Arc<TelemetryHub> {
        Arc::clone(&self.telemetry)
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycle
    }

    /// Run one full cycle. The actuator sees `set_speed` only when a
    /// transition fires.
    pub fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();

        let buffer = self
            .sampler
            .acquire(self.hardware.input.as_mut(), self.hardware.clock.as_ref());
        let reading = self.analyzer.analyze(&buffer);
        let (tone, suppressed_peak_hz) = self.classifier.classify_suppressed(reading.frequency_hz);
        let decision = self.controller.step(&mut self.state, tone, suppressed_peak_hz);

        let levels = self.controller.levels();
        let level = self.state.current_level;
        let duty = levels.duty(level);
        self.cycle += 1;

        if let Some(transition) = decision.transition {
            self.hardware.actuator.set_speed(duty);
            log::info!(
                "[ControlLoop] cycle {}: {} -> {} (duty {}) on {} at {:.1}Hz",
                self.cycle,
                levels.label(transition.from),
                levels.label(transition.to),
                duty,
                tone.label(),
                decision.peak_hz
            );
        }

        self.status.publish(level, self.state.direction, self.cycle);

        let report = CycleReport {
            cycle: self.cycle,
            peak_hz: reading.frequency_hz,
            suppressed_peak_hz: decision.peak_hz,
            tone,
            stable: decision.stable,
            stability_count: decision.stability_count,
            level,
            level_label: levels.label(level).to_string(),
            duty,
            transition: decision.transition,
        };

        self.telemetry.record_cycle(&report, started.elapsed());

        if self.log_every_n_cycles > 0 && self.cycle % self.log_every_n_cycles == 0 {
            tracing::debug!(
                cycle = report.cycle,
                peak_hz = report.peak_hz,
                tone = tone.label(),
                stability_count = report.stability_count,
                level = report.level_label.as_str(),
                "[ControlLoop] cycle complete"
            );
        }

        report
    }

    /// Run `count` cycles, pausing for the inter-cycle delay after each
    pub fn run_cycles(&mut self, count: u64) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(count as usize);
        for _ in 0..count {
            reports.push(self.run_cycle());
            self.pause();
        }
        reports
    }

    /// Run until the process is killed, handing each report to `on_cycle`
    pub fn run(&mut self, mut on_cycle: impl FnMut(&CycleReport)) -> ! {
        self.telemetry.record_phase(LifecyclePhase::LoopStarted);
        log::info!("[ControlLoop] loop started");
        loop {
            let report = self.run_cycle();
            on_cycle(&report);
            self.pause();
        }
    }

    fn pause(&self) {
        if !self.inter_cycle_delay.is_zero() {
            std::thread::sleep(self.inter_cycle_delay);
        }
    }
}
