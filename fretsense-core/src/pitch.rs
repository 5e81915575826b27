//! # Pitch Detection Module
//!
//! Time-domain monophonic pitch estimation used for live note tracking.
//! The detector is a center-clipped autocorrelation: cheap enough to run
//! once per animation-frame-sized block, robust enough for guitar, bass
//! and voice stems.
//!
//! ## Pipeline
//! - RMS noise gate to reject silence before the expensive correlation
//! - Center-clipping to suppress weak harmonic content and sharpen the
//!   fundamental-period peak
//! - Overlap-normalized autocorrelation over the configured lag range,
//!   preferring the earliest near-maximal peak to avoid octave errors
//! - Parabolic interpolation for sub-sample lag accuracy

use crate::config::AnalyzerConfig;

/// Correlation peaks below this are spurious maxima rather than true
/// periodicity; reject them instead of reporting a junk frequency.
const MIN_PEAK_CORRELATION: f32 = 0.005;

/// A raw per-frame pitch estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Estimated fundamental frequency in Hz.
    pub frequency: f32,
    /// Peak correlation normalized by the zero-lag energy (0.0 to 1.0).
    /// A pure periodic tone approaches 1.0; noise sits near 0.
    pub clarity: f32,
}

/// Estimates the dominant fundamental frequency of a monophonic signal.
///
/// Runs the full gate → clip → correlate → refine pipeline on one block
/// of time-domain samples. The caller is expected to invoke this once per
/// captured frame; the function holds no state between calls.
///
/// # Arguments
/// * `signal` - Input audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Session thresholds (silence floor, clip limit, search range)
///
/// # Returns
/// * `Some(estimate)` - Detected frequency with its clarity
/// * `None` - No reliable pitch (silence, noise, or out-of-range energy)
pub fn detect_pitch(
    signal: &[f32],
    sample_rate: u32,
    config: &AnalyzerConfig,
) -> Option<PitchEstimate> {
    let frame_size = signal.len();
    if frame_size == 0 || sample_rate == 0 {
        // Degenerate input is treated as silence, never as a fault.
        return None;
    }

    // --- Noise Gate: reject silence before the O(n * maxLag) step ---
    let rms = (signal.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>()
        / frame_size as f64)
        .sqrt() as f32;
    if rms < config.silence_rms_threshold {
        return None;
    }

    // --- Center-clipping ---
    // Samples inside the clip band are zeroed; the rest are shifted
    // toward zero by the limit. This flattens low-level harmonic ripple
    // so the fundamental period dominates the correlation.
    let clipped = center_clip(signal, config.clip_limit);

    // Zero-lag energy of the clipped buffer. If everything fell inside
    // the clip band there is nothing left to correlate.
    let energy = clipped
        .iter()
        .map(|&s| (s as f64) * (s as f64))
        .sum::<f64>()
        / frame_size as f64;
    if energy <= f64::EPSILON {
        return None;
    }

    // --- Lag range from the configured frequency range ---
    let lag_min = ((sample_rate as f32 / config.max_frequency_hz).ceil() as usize).max(1);
    let lag_max =
        ((sample_rate as f32 / config.min_frequency_hz).floor() as usize).min(frame_size - 1);
    if lag_min >= lag_max {
        // The block is too short to resolve the requested range.
        return None;
    }

    // --- Autocorrelation over the lag range ---
    // Each lag is normalized by its overlap length so long lags are not
    // penalized for having fewer product terms.
    let mut correlations = vec![0.0f32; lag_max - lag_min + 1];
    for (slot, lag) in (lag_min..=lag_max).enumerate() {
        let overlap = frame_size - lag;
        let mut sum = 0.0f64;
        for i in 0..overlap {
            sum += (clipped[i] as f64) * (clipped[i + lag] as f64);
        }
        correlations[slot] = (sum / overlap as f64) as f32;
    }

    let max_value = correlations.iter().copied().fold(f32::MIN, f32::max);
    if max_value < MIN_PEAK_CORRELATION {
        return None;
    }

    // Peak selection: the smallest lag that is an interior local maximum
    // within a small tolerance of the global maximum. A normalized ACF
    // scores every period multiple of a tone almost identically, so
    // taking the global maximum outright lets rounding noise pick a
    // lower octave; preferring the earliest near-maximal peak locks onto
    // the fundamental period. Energy below the search range produces a
    // monotonically decaying ACF with no interior local maximum at all,
    // which is rejected here instead of aliasing to a spurious in-range
    // frequency.
    let peak_floor = max_value * 0.98;
    let best_slot = (1..correlations.len() - 1).find(|&slot| {
        correlations[slot] >= peak_floor
            && correlations[slot] >= correlations[slot - 1]
            && correlations[slot] >= correlations[slot + 1]
    })?;
    let best_value = correlations[best_slot];

    // --- Parabolic interpolation around the peak lag ---
    let best_lag = lag_min + best_slot;
    let y1 = correlations[best_slot - 1];
    let y2 = best_value;
    let y3 = correlations[best_slot + 1];
    let denominator = y1 - 2.0 * y2 + y3;
    let refined_lag = if denominator.abs() > f32::EPSILON {
        let peak_shift = (y1 - y3) / (2.0 * denominator);
        best_lag as f32 + peak_shift
    } else {
        best_lag as f32
    };

    let frequency = sample_rate as f32 / refined_lag;

    // Estimates that drift outside the configured range are likely
    // octave errors or noise; filter them here rather than in the caller.
    if !frequency.is_finite()
        || frequency < config.min_frequency_hz
        || frequency > config.max_frequency_hz
    {
        return None;
    }

    let clarity = ((best_value as f64 / energy).clamp(0.0, 1.0)) as f32;

    Some(PitchEstimate { frequency, clarity })
}

/// Applies center-clipping to a signal.
///
/// Samples with magnitude below `limit` become zero; the rest are shifted
/// toward zero by `limit` so the output stays continuous at the clip
/// boundary.
fn center_clip(signal: &[f32], limit: f32) -> Vec<f32> {
    signal
        .iter()
        .map(|&s| {
            if s.abs() < limit {
                0.0
            } else if s > 0.0 {
                s - limit
            } else {
                s + limit
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, amplitude: f32, sample_rate: u32, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| {
                (i as f32 * frequency * 2.0 * std::f32::consts::PI / sample_rate as f32).sin()
                    * amplitude
            })
            .collect()
    }

    #[test]
    fn test_silence_yields_no_pitch() {
        let config = AnalyzerConfig::guitar();
        let silence = vec![0.0f32; 2048];
        assert!(detect_pitch(&silence, 44100, &config).is_none());
    }

    #[test]
    fn test_quiet_noise_below_gate_yields_no_pitch() {
        let config = AnalyzerConfig::guitar();
        // Amplitude 0.005 -> RMS ~0.0035, below the 0.01 floor.
        let quiet = sine(440.0, 0.005, 44100, 2048);
        assert!(detect_pitch(&quiet, 44100, &config).is_none());
    }

    #[test]
    fn test_empty_block_yields_no_pitch() {
        let config = AnalyzerConfig::guitar();
        assert!(detect_pitch(&[], 44100, &config).is_none());
    }

    #[test]
    fn test_detects_a4_within_tolerance() {
        let config = AnalyzerConfig::guitar();
        let signal = sine(440.0, 0.5, 44100, 2048);
        let estimate = detect_pitch(&signal, 44100, &config).expect("should detect 440 Hz");
        let relative_error = (estimate.frequency - 440.0).abs() / 440.0;
        assert!(
            relative_error < 0.02,
            "expected ~440 Hz, got {:.2}",
            estimate.frequency
        );
        assert!(estimate.clarity > 0.0);
    }

    #[test]
    fn test_detects_low_e_string() {
        let config = AnalyzerConfig::guitar();
        // E2, lowest standard guitar string.
        let signal = sine(82.41, 0.5, 44100, 4096);
        let estimate = detect_pitch(&signal, 44100, &config).expect("should detect E2");
        let relative_error = (estimate.frequency - 82.41).abs() / 82.41;
        assert!(
            relative_error < 0.02,
            "expected ~82.41 Hz, got {:.2}",
            estimate.frequency
        );
    }

    #[test]
    fn test_rejects_frequency_below_search_range() {
        let config = AnalyzerConfig::guitar();
        // 30 Hz is below the guitar preset's 60 Hz floor. The block is long
        // enough that the gate passes; the range check must reject it.
        let signal = sine(30.0, 0.5, 44100, 4096);
        assert!(detect_pitch(&signal, 44100, &config).is_none());
    }

    #[test]
    fn test_pure_tone_has_high_clarity() {
        let config = AnalyzerConfig::guitar();
        let signal = sine(220.0, 0.5, 44100, 2048);
        let estimate = detect_pitch(&signal, 44100, &config).unwrap();
        assert!(
            estimate.clarity > 0.5,
            "pure tone clarity too low: {}",
            estimate.clarity
        );
    }

    #[test]
    fn test_center_clip_zeroes_small_samples() {
        let clipped = center_clip(&[0.05, -0.05, 0.5, -0.5], 0.1);
        assert_eq!(clipped[0], 0.0);
        assert_eq!(clipped[1], 0.0);
        assert!((clipped[2] - 0.4).abs() < 1e-6);
        assert!((clipped[3] + 0.4).abs() < 1e-6);
    }
}
