//! # Analyzer Module
//!
//! Per-frame pipeline façades. A host (CLI, GUI, or anything that can
//! pull fixed-size sample blocks) feeds one block per frame and gets
//! back the raw estimate plus at most one stable event per call.

use crate::config::{AnalyzerConfig, ConfigError};
use crate::fft;
use crate::note::{self, Note};
use crate::percussion::{DrumClass, PercussionClassifier};
use crate::pitch;
use crate::stability::StabilityFilter;

/// Represents the result of a single audio analysis frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// The detected fundamental frequency in Hz, after refinement.
    pub frequency: Option<f32>,
    /// Clarity of the detection (0.0 to 1.0).
    pub clarity: Option<f32>,
    /// The nearest equal-tempered note to the detected frequency.
    pub note: Option<Note>,
    /// Deviation from the nearest note's target frequency in cents.
    pub cents_deviation: Option<f32>,
    /// Stable note event, emitted at most once per note by the
    /// stability filter.
    pub stable_note: Option<Note>,
}

impl AnalysisResult {
    fn no_pitch() -> Self {
        Self {
            frequency: None,
            clarity: None,
            note: None,
            cents_deviation: None,
            stable_note: None,
        }
    }
}

/// Melodic analysis session: pitch estimation, note mapping, and
/// stability voting behind a single per-frame entry point.
///
/// The configuration is fixed for the lifetime of the analyzer;
/// switching instruments means constructing a new analyzer. The only
/// mutable state is the stability filter's vote window.
#[derive(Debug, Clone)]
pub struct NoteAnalyzer {
    config: AnalyzerConfig,
    filter: StabilityFilter<Note>,
}

impl NoteAnalyzer {
    /// Creates an analyzer for one session, validating the config up
    /// front.
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let filter = StabilityFilter::new(config.vote_window_size, config.majority_threshold)?;
        Ok(Self { config, filter })
    }

    /// The session configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Processes one fixed-size block of samples.
    ///
    /// Runs estimate → note mapping → stability vote and returns the
    /// complete per-frame picture. Frames with no reliable pitch do not
    /// vote; the window keeps its existing ballots until the next
    /// pitched frame or a `reset`.
    ///
    /// # Arguments
    /// * `samples` - Time-domain samples in [-1.0, 1.0]
    /// * `sample_rate` - Sample rate in Hz, constant for the session
    pub fn process_frame(&mut self, samples: &[f32], sample_rate: u32) -> AnalysisResult {
        let Some(estimate) = pitch::detect_pitch(samples, sample_rate, &self.config) else {
            return AnalysisResult::no_pitch();
        };

        let frequency = if self.config.spectrum_refinement {
            let spectrum = fft::magnitude_spectrum(samples);
            let refined = fft::refine_from_spectrum(&spectrum, estimate.frequency, sample_rate);
            accept_refinement(&self.config, estimate.frequency, refined)
        } else {
            estimate.frequency
        };

        let (note, target_frequency) = note::nearest_note(frequency);
        let cents_deviation = note::cents_deviation(frequency, target_frequency);
        let stable_note = self.filter.observe(note);

        AnalysisResult {
            frequency: Some(frequency),
            clarity: Some(estimate.clarity),
            note: Some(note),
            cents_deviation: Some(cents_deviation),
            stable_note,
        }
    }

    /// Clears all vote state. Call when the audio source changes.
    pub fn reset(&mut self) {
        self.filter.reset();
    }
}

/// Keeps a spectral refinement only if it stayed inside the configured
/// frequency range.
///
/// Near the bottom of the range the refinement's bin search can be
/// pulled onto low-frequency spectral energy and come back well below
/// `min_frequency_hz`; the time-domain estimate already passed the range
/// check, so it wins in that case.
fn accept_refinement(config: &AnalyzerConfig, rough: f32, refined: f32) -> f32 {
    if refined >= config.min_frequency_hz && refined <= config.max_frequency_hz {
        refined
    } else {
        rough
    }
}

/// Percussion analysis session: the same pitch estimator front end, but
/// estimates are bucketed into drum classes with a post-trigger
/// hold-off instead of being note-mapped and vote-filtered.
#[derive(Debug, Clone)]
pub struct DrumAnalyzer {
    config: AnalyzerConfig,
    classifier: PercussionClassifier,
}

impl DrumAnalyzer {
    /// Creates a drum analyzer; the `AnalyzerConfig::drums` preset is
    /// the intended starting point.
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            classifier: PercussionClassifier::default(),
        })
    }

    /// Processes one block and returns a discrete hit, if any.
    pub fn process_frame(&mut self, samples: &[f32], sample_rate: u32) -> Option<DrumClass> {
        let estimate = pitch::detect_pitch(samples, sample_rate, &self.config);
        self.classifier.observe(estimate.map(|e| e.frequency))
    }

    /// Clears the hold-off timer. Call when the audio source changes.
    pub fn reset(&mut self) {
        self.classifier.reset();
    }
}
