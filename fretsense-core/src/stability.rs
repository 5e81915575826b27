//! # Stability Filter Module
//!
//! Majority-vote debouncing of the raw per-frame label stream. Raw
//! autocorrelation estimates are noisy near note transitions and during
//! vibrato or sustain decay; requiring a label to dominate a short
//! rolling window trades a few frames of latency for a display that
//! does not flicker.
//!
//! The filter is generic over the label type rather than hard-coded to
//! notes, so a host can debounce any discrete per-frame stream with the
//! same voting rules. Percussion takes a different path: drum hits are
//! gated by a hold-off timer instead of a vote window.

use crate::config::{AnalyzerConfig, ConfigError};
use std::collections::VecDeque;

/// Debounces a stream of per-frame labels into stable events.
///
/// Owns its vote window exclusively; one filter instance belongs to one
/// audio session and must be `reset` when the audio source changes so
/// stale votes cannot bias the new source's first readings.
#[derive(Debug, Clone)]
pub struct StabilityFilter<L> {
    window: VecDeque<L>,
    capacity: usize,
    majority_threshold: f32,
    last_emitted: Option<L>,
}

impl<L: Clone + PartialEq> StabilityFilter<L> {
    /// Creates a filter with the given vote window capacity and majority
    /// threshold.
    ///
    /// Fails fast on invalid parameters; these are programmer errors,
    /// not runtime conditions.
    pub fn new(capacity: usize, majority_threshold: f32) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidParameter(
                "vote window capacity must be > 0".to_string(),
            ));
        }
        if !majority_threshold.is_finite()
            || majority_threshold <= 0.0
            || majority_threshold > 1.0
        {
            return Err(ConfigError::InvalidParameter(format!(
                "majority threshold must be in (0, 1], got {}",
                majority_threshold
            )));
        }
        Ok(Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            majority_threshold,
            last_emitted: None,
        })
    }

    /// Creates a filter from a validated session config.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(config.vote_window_size, config.majority_threshold)
    }

    /// Feeds one raw label and returns a stable event if the vote passes.
    ///
    /// The label is pushed onto the FIFO window (evicting the oldest
    /// entry at capacity), the window is tallied, and the dominant label
    /// is emitted when it holds at least `majority_threshold` of the
    /// window capacity and differs from the last emitted label. Ties
    /// break toward the most recently observed label, which keeps the
    /// outcome deterministic and biased to the fresher reading.
    pub fn observe(&mut self, label: L) -> Option<L> {
        self.window.push_back(label);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }

        let (winner, count) = self.tally()?;
        let share = count as f32 / self.capacity as f32;
        if share >= self.majority_threshold && Some(&winner) != self.last_emitted.as_ref() {
            self.last_emitted = Some(winner.clone());
            return Some(winner);
        }
        None
    }

    /// Clears the vote window and the last-emitted memory.
    ///
    /// Call when the audio source changes (track switch, stem switch) so
    /// the next emission reflects only the new source.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_emitted = None;
    }

    /// Number of votes currently held in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window holds no votes.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    // Scans oldest-to-newest so that on equal counts the label observed
    // most recently wins.
    fn tally(&self) -> Option<(L, usize)> {
        let mut winner: Option<(usize, usize)> = None; // (index, count)
        for (index, label) in self.window.iter().enumerate() {
            let count = self.window.iter().filter(|l| *l == label).count();
            match winner {
                Some((_, best)) if count < best => {}
                _ => winner = Some((index, count)),
            }
        }
        winner.map(|(index, count)| (self.window[index].clone(), count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(capacity: usize, threshold: f32) -> StabilityFilter<&'static str> {
        StabilityFilter::new(capacity, threshold).unwrap()
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(StabilityFilter::<&str>::new(0, 0.6).is_err());
        assert!(StabilityFilter::<&str>::new(5, 0.0).is_err());
        assert!(StabilityFilter::<&str>::new(5, 1.5).is_err());
        assert!(StabilityFilter::<&str>::new(5, f32::NAN).is_err());
    }

    #[test]
    fn test_repeated_label_emits_exactly_once() {
        let mut f = filter(5, 0.6);
        let mut emissions = Vec::new();
        for _ in 0..10 {
            if let Some(label) = f.observe("A4") {
                emissions.push(label);
            }
        }
        assert_eq!(emissions, vec!["A4"]);
    }

    #[test]
    fn test_emission_requires_majority_share() {
        let mut f = filter(5, 0.6);
        // Two votes out of a capacity of five is 40%, below threshold.
        assert_eq!(f.observe("A4"), None);
        assert_eq!(f.observe("A4"), None);
        // Third identical vote reaches 60%.
        assert_eq!(f.observe("A4"), Some("A4"));
    }

    #[test]
    fn test_alternating_labels_emit_nothing() {
        let mut f = filter(6, 0.6);
        // Strict alternation caps either label at half the window, below
        // the 60% majority.
        for i in 0..40 {
            let label = if i % 2 == 0 { "A4" } else { "B4" };
            assert_eq!(f.observe(label), None);
        }
    }

    #[test]
    fn test_note_change_emits_new_winner() {
        let mut f = filter(5, 0.6);
        for _ in 0..5 {
            f.observe("A4");
        }
        let mut emitted = None;
        for _ in 0..5 {
            if let Some(label) = f.observe("C5") {
                emitted = Some(label);
                break;
            }
        }
        assert_eq!(emitted, Some("C5"));
    }

    #[test]
    fn test_tie_breaks_toward_most_recent() {
        // Window of 4, threshold 0.5: two votes each. The label whose
        // vote arrived last must win the tie.
        let mut f = filter(4, 0.5);
        f.observe("A4");
        f.observe("A4");
        // First emission happens here (A4 holds 2/4 = 50%).
        f.observe("C5");
        let out = f.observe("C5");
        assert_eq!(out, Some("C5"));
    }

    #[test]
    fn test_reset_discards_pre_reset_votes() {
        let mut f = filter(5, 0.6);
        f.observe("A4");
        f.observe("A4");
        f.reset();
        assert!(f.is_empty());
        // Post-reset, two fresh votes must not combine with the old ones.
        assert_eq!(f.observe("A4"), None);
        assert_eq!(f.observe("A4"), None);
        assert_eq!(f.observe("A4"), Some("A4"));
    }

    #[test]
    fn test_reset_clears_last_emitted() {
        let mut f = filter(3, 0.6);
        for _ in 0..3 {
            f.observe("A4");
        }
        f.reset();
        // The same note may be emitted again after a reset; it is a new
        // session as far as the filter is concerned.
        let emissions: Vec<_> = (0..3).filter_map(|_| f.observe("A4")).collect();
        assert_eq!(emissions, vec!["A4"]);
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut f = filter(5, 0.9);
        for _ in 0..20 {
            f.observe("A4");
        }
        assert_eq!(f.len(), 5);
    }
}
