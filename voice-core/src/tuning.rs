//! # Note & Voice Type Module
//!
//! This module maps a frequency onto musical and vocal vocabulary: the nearest
//! equal-tempered note name (A4 = 440 Hz) and a coarse voice-type category.
//!
//! ## Features
//! - Scientific pitch notation note names ("A4", "C#3")
//! - Fixed, ordered voice-type threshold ladder
//! - Voice-type descriptions for saved profiles

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Chromatic note names starting at C, the octave boundary.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Reference pitch for A4 in Hz.
pub const A4_HZ: f32 = 440.0;

/// Placeholder shown when no note can be named.
pub const NO_NOTE: &str = "-";

/// Fallback description for voice types missing from the description table.
pub const GENERIC_DESCRIPTION: &str = "Standard Voice Profile";

/// Coarse pitch-range category derived from the dominant frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceType {
    Bass,
    Baritone,
    Tenor,
    Alto,
    Soprano,
    Whistle,
    Unknown,
}

impl VoiceType {
    pub const ALL: [VoiceType; 7] = [
        VoiceType::Bass,
        VoiceType::Baritone,
        VoiceType::Tenor,
        VoiceType::Alto,
        VoiceType::Soprano,
        VoiceType::Whistle,
        VoiceType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VoiceType::Bass => "Bass",
            VoiceType::Baritone => "Baritone",
            VoiceType::Tenor => "Tenor",
            VoiceType::Alto => "Alto",
            VoiceType::Soprano => "Soprano",
            VoiceType::Whistle => "Whistle",
            VoiceType::Unknown => "Unknown",
        }
    }

    /// Human-readable character of this voice type.
    pub fn description(self) -> &'static str {
        describe_voice_type(self.as_str())
    }
}

impl fmt::Display for VoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoiceType::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown voice type '{s}'"))
    }
}

/// Descriptions keyed by voice type name.
///
/// Keyed by string rather than [`VoiceType`] because stored profiles carry the
/// category as free text and may name categories this build does not know.
static VOICE_DESCRIPTIONS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("Bass", "Deep, Authoritative & Resonant"),
        ("Baritone", "Rich, Warm & Smooth"),
        ("Tenor", "Bright, Clear & Balanced"),
        ("Alto", "Dynamic, Expressive & Range"),
        ("Soprano", "High, Piercing & Brilliant"),
        ("Whistle", "Ultra-High Frequency"),
        ("Unknown", "Indeterminate Range"),
    ])
});

/// Looks up the description for a voice type name, falling back to
/// [`GENERIC_DESCRIPTION`] for names outside the table.
pub fn describe_voice_type(name: &str) -> &'static str {
    VOICE_DESCRIPTIONS
        .get(name)
        .copied()
        .unwrap_or(GENERIC_DESCRIPTION)
}

/// Names the equal-tempered note closest to a frequency.
///
/// The note is found by counting half steps from C0 (A4 * 2^-4.75). Octave
/// and note index come from Euclidean division, so frequencies below C0
/// wrap into negative octaves ("B-1") instead of producing an invalid index.
///
/// # Arguments
/// * `freq` - Frequency in Hz
///
/// # Returns
/// * Note name such as `"A4"`, or `"-"` for non-positive or non-finite input
pub fn classify_note(freq: f32) -> String {
    if !freq.is_finite() || freq <= 0.0 {
        return NO_NOTE.to_string();
    }

    let c0 = A4_HZ * 2.0_f32.powf(-4.75);
    let half_steps = (12.0 * (freq / c0).log2()).round() as i32;
    let octave = half_steps.div_euclid(12);
    let note_index = half_steps.rem_euclid(12) as usize;

    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Buckets a frequency into a voice type.
///
/// Thresholds are checked in ascending order with exclusive upper bounds:
/// below 60 Hz is `Unknown`, then Bass (<120), Baritone (<170), Tenor (<260),
/// Alto (<400), Soprano (<800) and everything above is `Whistle`.
pub fn classify_voice_type(freq: f32) -> VoiceType {
    const LADDER: [(f32, VoiceType); 6] = [
        (60.0, VoiceType::Unknown),
        (120.0, VoiceType::Bass),
        (170.0, VoiceType::Baritone),
        (260.0, VoiceType::Tenor),
        (400.0, VoiceType::Alto),
        (800.0, VoiceType::Soprano),
    ];

    LADDER
        .iter()
        .find(|(upper, _)| freq < *upper)
        .map(|&(_, voice)| voice)
        .unwrap_or(VoiceType::Whistle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_reference_pitches() {
        assert_eq!(classify_note(440.0), "A4");
        assert_eq!(classify_note(261.63), "C4");
        assert_eq!(classify_note(277.18), "C#4");
        assert_eq!(classify_note(110.0), "A2");
        assert_eq!(classify_note(16.35), "C0");
    }

    #[test]
    fn non_positive_frequency_has_no_note() {
        assert_eq!(classify_note(0.0), "-");
        assert_eq!(classify_note(-12.0), "-");
        assert_eq!(classify_note(f32::NAN), "-");
    }

    #[test]
    fn below_c0_wraps_into_negative_octave() {
        // One half step below C0.
        assert_eq!(classify_note(15.43), "B-1");
    }

    #[test]
    fn voice_type_boundaries() {
        let cases = [
            (59.0, VoiceType::Unknown),
            (60.0, VoiceType::Bass),
            (61.0, VoiceType::Bass),
            (119.0, VoiceType::Bass),
            (120.0, VoiceType::Baritone),
            (121.0, VoiceType::Baritone),
            (169.0, VoiceType::Baritone),
            (170.0, VoiceType::Tenor),
            (171.0, VoiceType::Tenor),
            (259.0, VoiceType::Tenor),
            (260.0, VoiceType::Alto),
            (261.0, VoiceType::Alto),
            (399.0, VoiceType::Alto),
            (400.0, VoiceType::Soprano),
            (401.0, VoiceType::Soprano),
            (799.0, VoiceType::Soprano),
            (800.0, VoiceType::Whistle),
            (801.0, VoiceType::Whistle),
        ];
        for (freq, expected) in cases {
            assert_eq!(classify_voice_type(freq), expected, "freq={freq}");
        }
        assert_eq!(classify_voice_type(0.0), VoiceType::Unknown);
    }

    #[test]
    fn descriptions_fall_back_for_unknown_names() {
        assert_eq!(VoiceType::Tenor.description(), "Bright, Clear & Balanced");
        assert_eq!(describe_voice_type("Unknown"), "Indeterminate Range");
        assert_eq!(describe_voice_type("Countertenor"), GENERIC_DESCRIPTION);
    }

    #[test]
    fn voice_type_parses_its_own_name() {
        for voice in VoiceType::ALL {
            assert_eq!(voice.as_str().parse::<VoiceType>(), Ok(voice));
        }
        assert!("Mezzo".parse::<VoiceType>().is_err());
    }
}
