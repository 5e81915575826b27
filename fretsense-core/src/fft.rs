//! # Spectrum Module
//!
//! FFT support for the optional spectral refinement pass. The
//! time-domain autocorrelation estimate is accurate to a fraction of a
//! sample period; re-locating the peak in the magnitude spectrum with
//! parabolic sub-bin interpolation tightens it further for display of
//! cent deviations.

use rustfft::{num_complex::Complex, FftPlanner};

/// Removes the DC offset from a signal by making its average value zero.
///
/// A DC component shows up as a large bin at 0 Hz and skews the
/// magnitudes near the bottom of the spectrum.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window in place to reduce spectral leakage.
fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Computes the magnitude spectrum of one sample block.
///
/// The signal is DC-removed and Hann-windowed before the forward FFT.
/// Only the first half of the spectrum (up to Nyquist) is returned.
pub fn magnitude_spectrum(signal: &[f32]) -> Vec<f32> {
    if signal.is_empty() {
        return vec![];
    }

    let mut processed = signal.to_vec();
    remove_dc_offset(&mut processed);
    apply_hann_window(&mut processed);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(processed.len());

    let mut buffer: Vec<Complex<f32>> = processed
        .into_iter()
        .map(|sample| Complex { re: sample, im: 0.0 })
        .collect();
    fft.process(&mut buffer);

    buffer
        .iter()
        .take(signal.len() / 2)
        .map(|c| c.norm())
        .collect()
}

/// Refines a rough frequency estimate against a magnitude spectrum.
///
/// Searches a couple of bins around the estimate for the spectral peak
/// and interpolates its position to sub-bin accuracy using the log
/// magnitudes of the neighboring bins. Falls back to the rough estimate
/// whenever the neighborhood is degenerate.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum from [`magnitude_spectrum`]
/// * `rough_frequency` - Initial estimate in Hz
/// * `sample_rate` - Sample rate in Hz
pub fn refine_from_spectrum(spectrum: &[f32], rough_frequency: f32, sample_rate: u32) -> f32 {
    if rough_frequency <= 0.0 || spectrum.len() < 3 {
        return rough_frequency;
    }
    let block_size = spectrum.len() * 2;
    let target_bin = (rough_frequency * block_size as f32) / sample_rate as f32;

    let search_radius = 2.0;
    let start_bin = (target_bin - search_radius).max(0.0) as usize;
    let end_bin = ((target_bin + search_radius) as usize).min(spectrum.len() - 1);
    if start_bin >= end_bin {
        return rough_frequency;
    }

    let peak_bin = match spectrum[start_bin..=end_bin]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
    {
        Some((offset, _)) => start_bin + offset,
        None => return rough_frequency,
    };

    if peak_bin == 0 || peak_bin >= spectrum.len() - 1 {
        return rough_frequency;
    }

    let y1 = spectrum[peak_bin - 1].ln();
    let y2 = spectrum[peak_bin].ln();
    let y3 = spectrum[peak_bin + 1].ln();
    if !y1.is_finite() || !y2.is_finite() || !y3.is_finite() {
        return rough_frequency;
    }

    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-6 {
        return rough_frequency;
    }

    let peak_shift = (y3 - y1) / (2.0 * denominator);
    let interpolated_bin = peak_bin as f32 + peak_shift;
    let refined = (interpolated_bin * sample_rate as f32) / block_size as f32;

    if refined.is_finite() && refined > 0.0 {
        refined
    } else {
        rough_frequency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, sample_rate: u32, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| {
                (i as f32 * frequency * 2.0 * std::f32::consts::PI / sample_rate as f32).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn test_spectrum_peak_lands_on_tone_bin() {
        let sample_rate = 44100;
        let signal = sine(440.0, sample_rate, 2048);
        let spectrum = magnitude_spectrum(&signal);
        assert_eq!(spectrum.len(), 1024);

        let peak_bin = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let expected_bin = (440.0 * 2048.0 / sample_rate as f32).round() as usize;
        assert!(
            (peak_bin as i32 - expected_bin as i32).abs() <= 1,
            "peak at bin {}, expected ~{}",
            peak_bin,
            expected_bin
        );
    }

    #[test]
    fn test_refinement_improves_rough_estimate() {
        let sample_rate = 44100;
        let signal = sine(440.0, sample_rate, 2048);
        let spectrum = magnitude_spectrum(&signal);

        // Start 5 Hz off and expect the refinement to land closer.
        let refined = refine_from_spectrum(&spectrum, 445.0, sample_rate);
        assert!(
            (refined - 440.0).abs() < 5.0,
            "refined estimate {:.2} not closer to 440",
            refined
        );
    }

    #[test]
    fn test_refinement_degenerate_inputs_fall_back() {
        assert_eq!(refine_from_spectrum(&[], 440.0, 44100), 440.0);
        assert_eq!(refine_from_spectrum(&[1.0, 2.0], 440.0, 44100), 440.0);
        let spectrum = vec![0.0f32; 64];
        assert_eq!(refine_from_spectrum(&spectrum, -1.0, 44100), -1.0);
    }

    #[test]
    fn test_empty_signal_yields_empty_spectrum() {
        assert!(magnitude_spectrum(&[]).is_empty());
    }
}
