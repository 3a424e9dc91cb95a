// Peak module - dominant frequency extraction from a magnitude spectrum

/// Find the dominant frequency in a full-length magnitude spectrum
///
/// Only strict local maxima among bins `1..=N/2` are candidates, which keeps
/// the DC bin and its leakage skirt out of the running. The tallest candidate
/// is refined with a parabola through it and its two neighbours.
///
/// # Arguments
/// * `magnitudes` - Magnitudes of all N FFT bins
/// * `sampling_frequency_hz` - Rate the samples were taken at
///
/// # Returns
/// `(frequency_hz, magnitude)`; `(0.0, 0.0)` when the spectrum has no peak.
/// The frequency is clamped to `[0, fs/2]`.
pub fn major_peak(magnitudes: &[f32], sampling_frequency_hz: f32) -> (f32, f32) {
    let n = magnitudes.len();
    if n < 4 {
        return (0.0, 0.0);
    }

    let half = n / 2;
    let mut best: Option<(usize, f32)> = None;
    for i in 1..=half {
        let (prev, here, next) = (magnitudes[i - 1], magnitudes[i], magnitudes[i + 1]);
        if prev < here && here > next && best.map_or(true, |(_, mag)| here > mag) {
            best = Some((i, here));
        }
    }

    let Some((index, magnitude)) = best else {
        return (0.0, 0.0);
    };

    let (a, b, c) = (
        magnitudes[index - 1],
        magnitudes[index],
        magnitudes[index + 1],
    );
    // b is a strict local maximum, so the curvature is negative
    let delta = 0.5 * (a - c) / (a - 2.0 * b + c);
    let bin_width = sampling_frequency_hz / n as f32;
    let frequency = ((index as f32 + delta) * bin_width).clamp(0.0, sampling_frequency_hz / 2.0);

    (frequency, magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_spectrum_has_no_peak() {
        assert_eq!(major_peak(&[1.0; 64], 1000.0), (0.0, 0.0));
    }

    #[test]
    fn dc_only_spectrum_has_no_peak() {
        let mut spectrum = vec![0.0; 64];
        spectrum[0] = 100.0;
        spectrum[1] = 40.0;
        assert_eq!(major_peak(&spectrum, 1000.0).0, 0.0);
    }

    #[test]
    fn symmetric_peak_lands_on_bin_centre() {
        let mut spectrum = vec![0.0; 64];
        spectrum[27] = 5.0;
        spectrum[28] = 10.0;
        spectrum[29] = 5.0;
        let (freq, mag) = major_peak(&spectrum, 1000.0);
        assert!((freq - 437.5).abs() < 1e-3);
        assert_eq!(mag, 10.0);
    }

    #[test]
    fn asymmetric_neighbours_shift_estimate() {
        let mut spectrum = vec![0.0; 64];
        spectrum[27] = 2.0;
        spectrum[28] = 10.0;
        spectrum[29] = 8.0;
        let (freq, _) = major_peak(&spectrum, 1000.0);
        assert!(freq > 437.5 && freq < 437.5 + 15.625 / 2.0, "freq {}", freq);
    }

    #[test]
    fn tallest_local_maximum_wins() {
        let mut spectrum = vec![0.0; 64];
        spectrum[10] = 6.0;
        spectrum[20] = 9.0;
        spectrum[30] = 3.0;
        let (freq, _) = major_peak(&spectrum, 1000.0);
        assert!((freq - 312.5).abs() < 1e-3);
    }

    #[test]
    fn nyquist_bin_is_bounded() {
        let mut spectrum = vec![0.0; 64];
        spectrum[31] = 1.0;
        spectrum[32] = 10.0;
        spectrum[33] = 1.0;
        let (freq, _) = major_peak(&spectrum, 1000.0);
        assert!(freq <= 500.0);
        assert!((freq - 500.0).abs() < 1e-3);
    }
}
