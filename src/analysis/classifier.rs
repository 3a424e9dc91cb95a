// Classifier - maps a peak frequency onto the configured tone bands
//
// Two disjoint, inclusive bands are recognised. Anything outside both is
// "no tone": ambient hum, harmonics and estimator noise are suppressed
// here instead of being reported as errors.

use crate::config::{BandBounds, BandConfig};

/// Recognised control tones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Peak inside the low band: step the motor down
    TargetLow,
    /// Peak inside the high band: step the motor up
    TargetHigh,
    /// Peak outside both bands
    None,
}

impl Tone {
    pub fn is_target(self) -> bool {
        !matches!(self, Tone::None)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tone::TargetLow => "target_low",
            Tone::TargetHigh => "target_high",
            Tone::None => "none",
        }
    }
}

/// A labelled inclusive frequency band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneBand {
    pub tone: Tone,
    pub bounds: BandBounds,
}

impl ToneBand {
    pub fn contains(&self, frequency_hz: f32) -> bool {
        self.bounds.min_hz <= frequency_hz && frequency_hz <= self.bounds.max_hz
    }
}

/// Band classifier with immutable bands
#[derive(Debug, Clone)]
pub struct ToneClassifier {
    low: ToneBand,
    high: ToneBand,
}

impl ToneClassifier {
    pub fn new(bands: &BandConfig) -> Self {
        Self {
            low: ToneBand {
                tone: Tone::TargetLow,
                bounds: bands.low,
            },
            high: ToneBand {
                tone: Tone::TargetHigh,
                bounds: bands.high,
            },
        }
    }

    pub fn bands(&self) -> [ToneBand; 2] {
        [self.low, self.high]
    }

    /// Classify a peak frequency
    pub fn classify(&self, peak_hz: f32) -> Tone {
        if self.low.contains(peak_hz) {
            Tone::TargetLow
        } else if self.high.contains(peak_hz) {
            Tone::TargetHigh
        } else {
            Tone::None
        }
    }

    /// Classify and suppress: out-of-band peaks are reported as 0 Hz
    pub fn classify_suppressed(&self, peak_hz: f32) -> (Tone, f32) {
        match self.classify(peak_hz) {
            Tone::None => (Tone::None, 0.0),
            tone => (tone, peak_hz),
        }
    }
}
