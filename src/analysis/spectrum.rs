// Spectrum module - windowed FFT magnitude computation
//
// Applies a Hamming window to the real samples, runs a forward complex FFT
// over the real/imaginary pair and converts every bin to its magnitude.
// The transform runs in f64 so rounding noise stays far below the leakage
// tail of a flat (silent) input, which must decay without local maxima.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Windowed FFT over a fixed transform size
pub struct SpectrumProcessor {
    fft: Arc<dyn Fft<f64>>,
    fft_size: usize,
    /// Hamming window (pre-computed)
    window: Vec<f64>,
}

impl SpectrumProcessor {
    /// Create a processor for `fft_size`-point transforms
    pub fn new(fft_size: usize) -> Self {
        let window = hamming_window(fft_size);
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        Self {
            fft,
            fft_size,
            window,
        }
    }

    /// Compute the magnitude of all `fft_size` bins
    ///
    /// Inputs shorter than the transform are zero-padded, longer ones are
    /// truncated to the first `fft_size` samples.
    pub fn magnitude_spectrum(&self, real: &[f32], imag: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f64>> = (0..self.fft_size)
            .map(|i| {
                let re = f64::from(real.get(i).copied().unwrap_or(0.0)) * self.window[i];
                let im = f64::from(imag.get(i).copied().unwrap_or(0.0)) * self.window[i];
                Complex::new(re, im)
            })
            .collect();

        self.fft.process(&mut buffer);

        buffer.iter().map(|c| c.norm() as f32).collect()
    }
}

/// Symmetric Hamming window: `0.54 - 0.46 cos(2πi / (n-1))`
fn hamming_window(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos())
        .collect()
}
