// Analysis module - spectral peak extraction and tone classification
//
// Pipeline per buffer:
// - spectrum: Hamming window + forward FFT + magnitude
// - peak: tallest local maximum below Nyquist, parabolic refinement
// - classifier: peak frequency -> TargetLow / TargetHigh / None
//
// The analyzer is stateless: each call depends only on its input buffer.

pub mod classifier;
mod peak;
mod spectrum;

pub use classifier::{Tone, ToneBand, ToneClassifier};
pub use peak::major_peak;

use spectrum::SpectrumProcessor;

use crate::config::SamplingConfig;
use crate::sampling::SampleBuffer;

/// Dominant frequency found in one sample buffer
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PeakReading {
    /// Interpolated peak frequency in Hz, within `[0, fs/2]`
    pub frequency_hz: f32,
    /// Magnitude of the winning FFT bin
    pub magnitude: f32,
}

/// Windowing + FFT + peak picking over fixed-size buffers
pub struct SpectralAnalyzer {
    spectrum: SpectrumProcessor,
    sampling_frequency_hz: f32,
}

impl SpectralAnalyzer {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            spectrum: SpectrumProcessor::new(config.sample_count),
            sampling_frequency_hz: config.sampling_frequency_hz as f32,
        }
    }

    /// Extract the dominant frequency from a buffer
    pub fn analyze(&self, buffer: &SampleBuffer) -> PeakReading {
        let magnitudes = self
            .spectrum
            .magnitude_spectrum(buffer.real(), buffer.imag());
        let (frequency_hz, magnitude) = major_peak(&magnitudes, self.sampling_frequency_hz);

        PeakReading {
            frequency_hz,
            magnitude,
        }
    }
}
