//! # Note Mapping Module
//!
//! Conversions between frequencies and musical note labels using 12-tone
//! equal temperament referenced to A4 = 440 Hz.
//!
//! Octave numbers follow the MIDI convention (C4 = MIDI 60), so
//! 440 Hz maps to A4. The mapping is total over positive frequencies;
//! a "no pitch" result must be filtered out upstream.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The twelve pitch classes of the chromatic scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in semitone order starting from C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Display name using sharps ("C", "C#", ...).
    pub fn name(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A musical note: pitch class plus octave ("A4", "C#3").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// One of the twelve chromatic pitch classes.
    pub pitch_class: PitchClass,
    /// Octave number, MIDI convention (C4 = MIDI 60).
    pub octave: i32,
}

/// Equal-temperament target frequencies for the full MIDI range,
/// computed once at startup. f = 440 * 2^((midi - 69) / 12).
static MIDI_FREQUENCIES: Lazy<[f32; 128]> = Lazy::new(|| {
    let mut table = [0.0f32; 128];
    for (midi, slot) in table.iter_mut().enumerate() {
        *slot = 440.0 * 2.0_f32.powf((midi as f32 - 69.0) / 12.0);
    }
    table
});

impl Note {
    /// Maps a frequency to the nearest equal-tempered note.
    ///
    /// `midi = round(12 * log2(freq / 440)) + 69`, with the pitch-class
    /// remainder taken non-negative so sub-C frequencies wrap correctly.
    ///
    /// # Arguments
    /// * `frequency` - Frequency in Hz, must be positive
    pub fn from_frequency(frequency: f32) -> Note {
        debug_assert!(frequency > 0.0, "frequency must be positive");
        let midi = (12.0 * (frequency / 440.0).log2()).round() as i32 + 69;
        Note::from_midi(midi)
    }

    /// Builds a note from a MIDI number (may be outside 0..=127).
    pub fn from_midi(midi: i32) -> Note {
        let pitch_class = PitchClass::ALL[midi.rem_euclid(12) as usize];
        let octave = midi.div_euclid(12) - 1;
        Note { pitch_class, octave }
    }

    /// The MIDI number of this note.
    pub fn midi_number(&self) -> i32 {
        (self.octave + 1) * 12 + PitchClass::ALL.iter().position(|c| c == &self.pitch_class).unwrap() as i32
    }

    /// The equal-temperament target frequency of this note in Hz.
    pub fn target_frequency(&self) -> f32 {
        let midi = self.midi_number();
        if (0..128).contains(&midi) {
            MIDI_FREQUENCIES[midi as usize]
        } else {
            440.0 * 2.0_f32.powf((midi as f32 - 69.0) / 12.0)
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

/// Finds the nearest note to a frequency along with its target frequency.
///
/// Used by display layers that want to show how far off-pitch the input
/// is, in addition to the note label itself.
pub fn nearest_note(frequency: f32) -> (Note, f32) {
    let note = Note::from_frequency(frequency);
    let target = note.target_frequency();
    (note, target)
}

/// Deviation of a measured frequency from a target frequency in cents.
///
/// 100 cents = 1 semitone. Positive values are sharp, negative flat.
pub fn cents_deviation(frequency: f32, target_frequency: f32) -> f32 {
    1200.0 * (frequency / target_frequency).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a440_is_a4() {
        // Pins the octave convention: MIDI, C4 = 60, so 440 Hz is A4.
        let note = Note::from_frequency(440.0);
        assert_eq!(note.pitch_class, PitchClass::A);
        assert_eq!(note.octave, 4);
        assert_eq!(note.to_string(), "A4");
    }

    #[test]
    fn test_middle_c() {
        let note = Note::from_frequency(261.63);
        assert_eq!(note.pitch_class, PitchClass::C);
        assert_eq!(note.octave, 4);
        assert_eq!(note.midi_number(), 60);
    }

    #[test]
    fn test_guitar_open_strings() {
        // Standard tuning: E2 A2 D3 G3 B3 E4.
        let cases = [
            (82.41, "E2"),
            (110.0, "A2"),
            (146.83, "D3"),
            (196.0, "G3"),
            (246.94, "B3"),
            (329.63, "E4"),
        ];
        for (freq, name) in cases {
            assert_eq!(Note::from_frequency(freq).to_string(), name);
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let a = Note::from_frequency(445.7);
        let b = Note::from_frequency(445.7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sub_c_wrap_is_non_negative() {
        // MIDI 0 is C-1; the remainder must wrap into 0..12.
        let note = Note::from_frequency(8.18);
        assert_eq!(note.pitch_class, PitchClass::C);
        assert_eq!(note.octave, -1);
    }

    #[test]
    fn test_slightly_flat_a_still_maps_to_a4() {
        let note = Note::from_frequency(432.0);
        assert_eq!(note.to_string(), "A4");
    }

    #[test]
    fn test_target_frequency_round_trip() {
        let (note, target) = nearest_note(440.0);
        assert_eq!(note.to_string(), "A4");
        assert!((target - 440.0).abs() < 1e-3);
    }

    #[test]
    fn test_cents_deviation_signs() {
        assert!(cents_deviation(445.0, 440.0) > 0.0);
        assert!(cents_deviation(435.0, 440.0) < 0.0);
        // One semitone up is +100 cents.
        let semitone = cents_deviation(466.16, 440.0);
        assert!((semitone - 100.0).abs() < 0.5);
    }
}
