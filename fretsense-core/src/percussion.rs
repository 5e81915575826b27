//! # Percussion Classification Module
//!
//! Policy variant of the stability pipeline for drum stems. Instead of
//! mapping frequency estimates to notes, raw estimates are bucketed into
//! fixed percussion classes, and a short hold-off timer after each
//! trigger turns sustained estimates into discrete "hit" events.

use crate::note::{Note, PitchClass};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percussion classes recognized by the drum analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrumClass {
    /// Kick drum, 40-110 Hz.
    Kick,
    /// Snare, 110-260 Hz.
    Snare,
    /// Low tom, 260-420 Hz.
    TomLow,
    /// Mid tom, 420-700 Hz.
    TomMid,
    /// Hi-hat, 700-1500 Hz.
    HiHat,
    /// Crash cymbal, above 1500 Hz.
    Crash,
}

impl DrumClass {
    /// Buckets a frequency estimate into a percussion class.
    ///
    /// Estimates below the kick floor are noise and yield `None`.
    pub fn from_frequency(frequency: f32) -> Option<DrumClass> {
        match frequency {
            f if f < 40.0 => None,
            f if f < 110.0 => Some(DrumClass::Kick),
            f if f < 260.0 => Some(DrumClass::Snare),
            f if f < 420.0 => Some(DrumClass::TomLow),
            f if f < 700.0 => Some(DrumClass::TomMid),
            f if f < 1500.0 => Some(DrumClass::HiHat),
            _ => Some(DrumClass::Crash),
        }
    }

    /// The note used to place this class on a piano-roll style display.
    pub fn display_note(&self) -> Note {
        match self {
            DrumClass::Kick => Note { pitch_class: PitchClass::C, octave: 3 },
            DrumClass::Snare => Note { pitch_class: PitchClass::D, octave: 3 },
            DrumClass::TomLow => Note { pitch_class: PitchClass::E, octave: 3 },
            DrumClass::TomMid => Note { pitch_class: PitchClass::G, octave: 3 },
            DrumClass::HiHat => Note { pitch_class: PitchClass::FSharp, octave: 4 },
            DrumClass::Crash => Note { pitch_class: PitchClass::C, octave: 5 },
        }
    }
}

impl fmt::Display for DrumClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrumClass::Kick => "kick",
            DrumClass::Snare => "snare",
            DrumClass::TomLow => "low tom",
            DrumClass::TomMid => "mid tom",
            DrumClass::HiHat => "hi-hat",
            DrumClass::Crash => "crash",
        };
        write!(f, "{}", name)
    }
}

/// Turns a stream of per-frame frequency estimates into discrete hits.
///
/// After each trigger the classifier ignores input for `holdoff_frames`
/// frames, so the ringing tail of a drum hit does not retrigger. One
/// classifier belongs to one audio session; `reset` it on source change.
#[derive(Debug, Clone)]
pub struct PercussionClassifier {
    holdoff_frames: usize,
    frames_until_ready: usize,
}

impl PercussionClassifier {
    /// Creates a classifier with the given post-trigger hold-off, in
    /// frames. At typical frame rates 6 frames is roughly 100 ms.
    pub fn new(holdoff_frames: usize) -> Self {
        Self {
            holdoff_frames,
            frames_until_ready: 0,
        }
    }

    /// Feeds one frame's frequency estimate (or `None` for no pitch).
    ///
    /// Returns a hit when an estimate buckets into a class and the
    /// hold-off from the previous hit has elapsed.
    pub fn observe(&mut self, estimate: Option<f32>) -> Option<DrumClass> {
        if self.frames_until_ready > 0 {
            self.frames_until_ready -= 1;
            return None;
        }
        let class = estimate.and_then(DrumClass::from_frequency)?;
        self.frames_until_ready = self.holdoff_frames;
        Some(class)
    }

    /// Clears the hold-off timer.
    pub fn reset(&mut self) {
        self.frames_until_ready = 0;
    }
}

impl Default for PercussionClassifier {
    fn default() -> Self {
        Self::new(6)
    }
}
