// fretsense-core/src/lib.rs

//! The core logic for the fretsense note tracker.
//! This crate turns blocks of time-domain audio into stable musical
//! note (or drum hit) events: monophonic pitch estimation via
//! center-clipped autocorrelation, equal-temperament note mapping, and
//! majority-vote debouncing. It is completely headless and contains no
//! UI code; a host pulls one sample block per frame and feeds it to an
//! analyzer.

pub mod analyzer;
pub mod audio;
pub mod config;
pub mod fft;
pub mod note;
pub mod percussion;
pub mod pitch;
pub mod stability;

pub use analyzer::{AnalysisResult, DrumAnalyzer, NoteAnalyzer};
pub use config::{AnalyzerConfig, ConfigError};
pub use note::{Note, PitchClass};
pub use percussion::DrumClass;
pub use pitch::PitchEstimate;
pub use stability::StabilityFilter;
