//! Configuration management for the tone-triggered speed controller
//!
//! Every tunable of the control loop lives here: sample count and rate,
//! the two tone bands, the debounce/hysteresis knobs, the speed level table
//! and the inter-cycle delay. Defaults reproduce the bench setup (64 samples
//! at 1 kHz, a 262 Hz "slower" tone and a 440 Hz "faster" tone). A JSON file
//! can override them without recompiling.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::actuator::Direction;
use crate::control::NonePolicy;
use crate::error::ControlError;
use crate::sampling::WaitStrategy;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub bands: BandConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
}

/// Sampler parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Samples per analysis buffer (must be a power of two)
    pub sample_count: usize,
    /// Sampling frequency in Hz; the highest detectable tone is half of this
    pub sampling_frequency_hz: u32,
    /// How the sampler waits for each sample deadline
    #[serde(default)]
    pub wait: WaitStrategy,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_count: 64,
            sampling_frequency_hz: 1000,
            wait: WaitStrategy::default(),
        }
    }
}

impl SamplingConfig {
    /// Microseconds between two samples, `round(1e6 / fs)`
    pub fn sampling_period_us(&self) -> u32 {
        (1_000_000.0 / self.sampling_frequency_hz as f64).round() as u32
    }

    pub fn nyquist_hz(&self) -> f32 {
        self.sampling_frequency_hz as f32 / 2.0
    }
}

/// Inclusive frequency interval in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandBounds {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl BandBounds {
    pub const fn new(min_hz: f32, max_hz: f32) -> Self {
        Self { min_hz, max_hz }
    }

    fn overlaps(&self, other: &BandBounds) -> bool {
        self.min_hz <= other.max_hz && other.min_hz <= self.max_hz
    }
}

/// The two recognised control tones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandConfig {
    /// Tone that steps the motor down (around middle C, 262 Hz)
    pub low: BandBounds,
    /// Tone that steps the motor up (around A4, 440 Hz)
    pub high: BandBounds,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            low: BandBounds::new(240.0, 290.0),
            high: BandBounds::new(420.0, 470.0),
        }
    }
}

/// One entry of the ordered speed level table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Display label, e.g. "Half"
    pub label: String,
    /// PWM duty written to the enable pin (0-255)
    pub duty: u8,
}

impl LevelConfig {
    pub fn new(label: &str, duty: u8) -> Self {
        Self {
            label: label.to_string(),
            duty,
        }
    }
}

/// Hysteresis and debounce parameters for the speed controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Maximum deviation between consecutive peaks to count as the same tone
    pub tolerance_hz: f32,
    /// A step fires once the stability count exceeds this value
    pub debounce_threshold: u32,
    /// Threshold for Off -> first level and first level -> Off.
    /// Falls back to `debounce_threshold` when unset.
    #[serde(default)]
    pub start_stop_threshold: Option<u32>,
    /// Stability count reported for a cycle without a recognised tone.
    /// Transitions do not depend on it; see [`NonePolicy`].
    #[serde(default)]
    pub none_policy: NonePolicy,
    /// Ordered speed levels, first entry is Off
    pub levels: Vec<LevelConfig>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tolerance_hz: 10.0,
            debounce_threshold: 5,
            start_stop_threshold: None,
            none_policy: NonePolicy::default(),
            levels: vec![
                LevelConfig::new("Off", 0),
                LevelConfig::new("Half", 135),
                LevelConfig::new("ThreeQuarter", 195),
                LevelConfig::new("Full", 255),
            ],
        }
    }
}

/// Motor output parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Spin direction applied once at startup
    #[serde(default)]
    pub direction: Direction,
}

/// Outer loop pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Pause after actuation before the next sampling phase
    pub inter_cycle_delay_ms: u64,
    /// Log a cycle summary every N cycles (0 disables)
    pub log_every_n_cycles: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            inter_cycle_delay_ms: 1000,
            log_every_n_cycles: 1,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// its JSON is invalid (a warning is logged in both cases).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load the configuration shipped next to the binary
    pub fn load() -> Self {
        Self::load_from_file("assets/tone_drive.json")
    }

    /// Check cross-field invariants the control loop relies on
    pub fn validate(&self) -> Result<(), ControlError> {
        let invalid = |reason: String| Err(ControlError::InvalidConfig { reason });

        let n = self.sampling.sample_count;
        if n < 4 || !n.is_power_of_two() {
            return invalid(format!("sample_count must be a power of two >= 4 (got {})", n));
        }
        if self.sampling.sampling_frequency_hz == 0 {
            return invalid("sampling_frequency_hz must be greater than 0".to_string());
        }

        let nyquist = self.sampling.nyquist_hz();
        for (name, band) in [("low", &self.bands.low), ("high", &self.bands.high)] {
            if !(band.min_hz >= 0.0 && band.min_hz <= band.max_hz) {
                return invalid(format!(
                    "{} band [{}, {}] is empty or negative",
                    name, band.min_hz, band.max_hz
                ));
            }
            if band.max_hz > nyquist {
                return invalid(format!(
                    "{} band upper bound {} Hz exceeds Nyquist ({} Hz)",
                    name, band.max_hz, nyquist
                ));
            }
        }
        if self.bands.low.overlaps(&self.bands.high) {
            return invalid("low and high tone bands overlap".to_string());
        }

        if !(self.controller.tolerance_hz >= 0.0) {
            return invalid("tolerance_hz must be non-negative".to_string());
        }

        let levels = &self.controller.levels;
        if levels.len() < 2 {
            return invalid(format!("need at least two speed levels (got {})", levels.len()));
        }
        if levels[0].duty != 0 {
            return invalid(format!("first speed level must have duty 0 (got {})", levels[0].duty));
        }
        if levels.windows(2).any(|pair| pair[0].duty >= pair[1].duty) {
            return invalid("speed level duties must be strictly increasing".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sampling.sample_count, 64);
        assert_eq!(config.sampling.sampling_frequency_hz, 1000);
        assert_eq!(config.sampling.sampling_period_us(), 1000);
        assert_eq!(config.controller.debounce_threshold, 5);
        assert_eq!(config.controller.tolerance_hz, 10.0);
        let duties: Vec<u8> = config.controller.levels.iter().map(|l| l.duty).collect();
        assert_eq!(duties, vec![0, 135, 195, 255]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sampling_period_rounds() {
        let sampling = SamplingConfig {
            sample_count: 64,
            sampling_frequency_hz: 3000,
            wait: WaitStrategy::Spin,
        };
        // 333.33.. us rounds down
        assert_eq!(sampling.sampling_period_us(), 333);

        let sampling = SamplingConfig {
            sampling_frequency_hz: 1600,
            ..sampling
        };
        assert_eq!(sampling.sampling_period_us(), 625);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.sampling.sample_count, config.sampling.sample_count);
        assert_eq!(parsed.bands.high, config.bands.high);
        assert_eq!(parsed.controller.levels, config.controller.levels);
    }

    #[test]
    fn test_partial_json_uses_section_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"cycle": {"inter_cycle_delay_ms": 0, "log_every_n_cycles": 0}}"#)
                .unwrap();
        assert_eq!(parsed.cycle.inter_cycle_delay_ms, 0);
        assert_eq!(parsed.sampling.sample_count, 64);
        assert_eq!(parsed.controller.levels.len(), 4);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = AppConfig::load_from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/assets/tone_drive.json"
        ));
        assert_eq!(
            serde_json::to_value(&shipped).unwrap(),
            serde_json::to_value(AppConfig::default()).unwrap()
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/definitely/not/here/tone_drive.json");
        assert_eq!(config.sampling.sample_count, 64);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let mut config = AppConfig::default();
        config.sampling.sample_count = 100;
        assert!(matches!(
            config.validate(),
            Err(ControlError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_overlapping_bands() {
        let mut config = AppConfig::default();
        config.bands.high = BandBounds::new(280.0, 470.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_touching_bands_overlap() {
        let mut config = AppConfig::default();
        config.bands.high = BandBounds::new(290.0, 470.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_band_above_nyquist() {
        let mut config = AppConfig::default();
        config.bands.high = BandBounds::new(420.0, 520.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_level_table() {
        let mut config = AppConfig::default();
        config.controller.levels = vec![LevelConfig::new("Off", 0)];
        assert!(config.validate().is_err());

        config.controller.levels = vec![LevelConfig::new("Slow", 10), LevelConfig::new("Fast", 20)];
        assert!(config.validate().is_err());

        config.controller.levels = vec![
            LevelConfig::new("Off", 0),
            LevelConfig::new("Fast", 200),
            LevelConfig::new("Slow", 100),
        ];
        assert!(config.validate().is_err());
    }
}
