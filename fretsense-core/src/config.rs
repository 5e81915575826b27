//! Analyzer configuration.
//!
//! Every threshold the detection pipeline uses lives here so that the
//! per-instrument variants (guitar, bass, voice, drums) are plain data
//! instead of near-identical copies of the processing code. A config is
//! read-only for the lifetime of one audio session; switching instruments
//! means building a new analyzer from a new config.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised when a configuration is rejected at construction time.
///
/// These are programmer errors, not runtime conditions, so the analyzer
/// constructors fail fast instead of limping along with bad thresholds.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A threshold or range parameter is outside its valid domain.
    InvalidParameter(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Tuning knobs for one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// RMS energy floor below which a frame is treated as silence.
    pub silence_rms_threshold: f32,
    /// Center-clipping threshold as a fraction of full scale.
    pub clip_limit: f32,
    /// Lower bound of the pitch search range in Hz.
    pub min_frequency_hz: f32,
    /// Upper bound of the pitch search range in Hz.
    pub max_frequency_hz: f32,
    /// Capacity of the stability filter's vote window.
    pub vote_window_size: usize,
    /// Fraction of the vote window a label must hold to be emitted.
    pub majority_threshold: f32,
    /// Refine the time-domain estimate against the magnitude spectrum.
    pub spectrum_refinement: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::guitar()
    }
}

impl AnalyzerConfig {
    /// Standard-tuning guitar. E2 (82 Hz) up past the high frets, with
    /// headroom on both sides for detuned strings and harmonics.
    pub fn guitar() -> Self {
        Self {
            silence_rms_threshold: 0.01,
            clip_limit: 0.15,
            min_frequency_hz: 60.0,
            max_frequency_hz: 1200.0,
            vote_window_size: 5,
            majority_threshold: 0.6,
            spectrum_refinement: true,
        }
    }

    /// Bass guitar. B0 on a five-string is ~31 Hz, so the search range
    /// sits much lower and the clip limit is relaxed for the rounder
    /// waveform.
    pub fn bass() -> Self {
        Self {
            min_frequency_hz: 30.0,
            max_frequency_hz: 400.0,
            clip_limit: 0.1,
            ..Self::guitar()
        }
    }

    /// Sung voice. A longer vote window rides out vibrato.
    pub fn voice() -> Self {
        Self {
            min_frequency_hz: 80.0,
            max_frequency_hz: 1100.0,
            vote_window_size: 8,
            ..Self::guitar()
        }
    }

    /// Percussion stems. The range is a classification span rather than
    /// a melodic one, and spectral refinement is pointless on noise
    /// bursts.
    pub fn drums() -> Self {
        Self {
            silence_rms_threshold: 0.02,
            min_frequency_hz: 40.0,
            max_frequency_hz: 2000.0,
            vote_window_size: 3,
            spectrum_refinement: false,
            ..Self::guitar()
        }
    }

    /// Checks every field against its valid domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.silence_rms_threshold.is_finite() || self.silence_rms_threshold < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "silence_rms_threshold must be finite and >= 0, got {}",
                self.silence_rms_threshold
            )));
        }
        if !self.clip_limit.is_finite() || self.clip_limit < 0.0 || self.clip_limit >= 1.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "clip_limit must be in [0, 1), got {}",
                self.clip_limit
            )));
        }
        if !self.min_frequency_hz.is_finite()
            || !self.max_frequency_hz.is_finite()
            || self.min_frequency_hz <= 0.0
            || self.min_frequency_hz >= self.max_frequency_hz
        {
            return Err(ConfigError::InvalidParameter(format!(
                "frequency range [{}, {}] must satisfy 0 < min < max",
                self.min_frequency_hz, self.max_frequency_hz
            )));
        }
        if self.vote_window_size == 0 {
            return Err(ConfigError::InvalidParameter(
                "vote_window_size must be > 0".to_string(),
            ));
        }
        if !self.majority_threshold.is_finite()
            || self.majority_threshold <= 0.0
            || self.majority_threshold > 1.0
        {
            return Err(ConfigError::InvalidParameter(format!(
                "majority_threshold must be in (0, 1], got {}",
                self.majority_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(AnalyzerConfig::guitar().validate().is_ok());
        assert!(AnalyzerConfig::bass().validate().is_ok());
        assert!(AnalyzerConfig::voice().validate().is_ok());
        assert!(AnalyzerConfig::drums().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_vote_window() {
        let config = AnalyzerConfig {
            vote_window_size: 0,
            ..AnalyzerConfig::guitar()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_majority_threshold_outside_unit_interval() {
        for bad in [0.0, -0.5, 1.5, f32::NAN] {
            let config = AnalyzerConfig {
                majority_threshold: bad,
                ..AnalyzerConfig::guitar()
            };
            assert!(config.validate().is_err(), "accepted threshold {}", bad);
        }
    }

    #[test]
    fn test_rejects_inverted_frequency_range() {
        let config = AnalyzerConfig {
            min_frequency_hz: 500.0,
            max_frequency_hz: 100.0,
            ..AnalyzerConfig::guitar()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = AnalyzerConfig::bass();
        let json = serde_json::to_string(&config).unwrap();
        let loaded: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, loaded);
    }
}
