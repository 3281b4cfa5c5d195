//! # Voice Profile Module
//!
//! Snapshots a session's statistics into an immutable, serializable voice
//! profile. Profiles are what the user saves, lists and compares.
//!
//! The JSON shape is shared with earlier exports:
//! `{id, name, voiceType, description, avgFreq, avgDb, maxDb, date, spectrumData}`
//! where `avgDb` is the number `-100` when nothing was measured and a
//! one-decimal string otherwise, and `maxDb` is always a one-decimal string.

use serde::{Deserialize, Serialize};

use crate::session::SessionStats;
use crate::tuning::{self, VoiceType};

/// Name used when a profile is saved without one.
pub const DEFAULT_PROFILE_NAME: &str = "Anonymous";

/// The values shown to the user before they confirm a save.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub voice_type: VoiceType,
    pub avg_freq: u32,
    pub avg_db: f64,
    pub max_db: f64,
}

impl ProfileSummary {
    pub fn from_stats(stats: &SessionStats) -> Self {
        Self {
            voice_type: stats.dominant_voice_type(),
            avg_freq: stats.average_frequency(),
            avg_db: stats.average_db(),
            max_db: stats.max_db,
        }
    }
}

/// A saved snapshot of one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    pub id: u64,
    pub name: String,
    /// Voice type name. Kept as text so records naming other categories still load.
    pub voice_type: String,
    #[serde(default)]
    pub description: String,
    pub avg_freq: u32,
    #[serde(with = "decibels::average")]
    pub avg_db: f64,
    #[serde(with = "decibels::fixed")]
    pub max_db: f64,
    #[serde(rename = "date")]
    pub created_at: String,
    #[serde(rename = "spectrumData")]
    pub spectrum_envelope: Vec<u8>,
}

impl VoiceProfile {
    /// Description to display, using the voice-type table when the record has none.
    pub fn display_description(&self) -> &str {
        if self.description.is_empty() {
            tuning::describe_voice_type(&self.voice_type)
        } else {
            &self.description
        }
    }

    /// Whether a loudness average was measured for this profile.
    pub fn has_loudness(&self) -> bool {
        self.avg_db > crate::pitch::SILENCE_DB
    }
}

/// Builds a profile from the current session statistics.
///
/// The max-hold envelope is copied, so later changes to the live session
/// never reach the saved profile.
///
/// # Arguments
/// * `stats` - Statistics of the session being saved
/// * `name` - Subject name; blank names become [`DEFAULT_PROFILE_NAME`]
/// * `id` - Unique profile id (creation time in milliseconds)
/// * `created_at` - Display timestamp
pub fn record_profile(stats: &SessionStats, name: &str, id: u64, created_at: String) -> VoiceProfile {
    let summary = ProfileSummary::from_stats(stats);
    let name = match name.trim() {
        "" => DEFAULT_PROFILE_NAME.to_string(),
        trimmed => trimmed.to_string(),
    };

    VoiceProfile {
        id,
        name,
        voice_type: summary.voice_type.to_string(),
        description: summary.voice_type.description().to_string(),
        avg_freq: summary.avg_freq,
        avg_db: summary.avg_db,
        max_db: summary.max_db,
        created_at,
        spectrum_envelope: stats.max_hold.clone(),
    }
}

/// Serde adapters for the dB fields of the export format.
mod decibels {
    use serde::{Deserialize, Deserializer};

    use crate::pitch::{round_tenths, SILENCE_DB};

    fn one_decimal(value: f64) -> String {
        format!("{:.1}", round_tenths(value))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn read<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        }
    }

    /// Always a one-decimal string.
    pub mod fixed {
        use serde::{Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&super::one_decimal(*value))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            super::read(deserializer)
        }
    }

    /// The silence sentinel as a number, anything else as a one-decimal string.
    pub mod average {
        use serde::{Deserializer, Serializer};

        use super::SILENCE_DB;

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            if *value <= SILENCE_DB {
                serializer.serialize_i32(SILENCE_DB as i32)
            } else {
                serializer.serialize_str(&super::one_decimal(*value))
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            super::read(deserializer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn synthetic_stats() -> SessionStats {
        let mut stats = SessionStats::new(4);
        stats.frequency_sum = 1200;
        stats.frequency_count = 10;
        stats.db_sum = -123.0;
        stats.db_count = 10;
        stats.max_db = -3.4;
        for _ in 0..6 {
            stats.voice_types.record(VoiceType::Baritone);
        }
        for _ in 0..4 {
            stats.voice_types.record(VoiceType::Bass);
        }
        stats.max_hold = vec![10, 200, 35, 0];
        stats
    }

    #[test]
    fn records_hand_computed_values() {
        let profile = record_profile(&synthetic_stats(), "Ada", 1_700_000_000_000, "today".into());
        assert_eq!(profile.avg_freq, 120);
        assert_eq!(profile.avg_db, -12.3);
        assert_eq!(profile.max_db, -3.4);
        assert_eq!(profile.voice_type, "Baritone");
        assert_eq!(profile.description, "Rich, Warm & Smooth");
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.spectrum_envelope, vec![10, 200, 35, 0]);
    }

    #[test]
    fn empty_session_uses_sentinels() {
        let profile = record_profile(&SessionStats::new(2), "   ", 1, String::new());
        assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
        assert_eq!(profile.avg_freq, 0);
        assert_eq!(profile.avg_db, -100.0);
        assert_eq!(profile.max_db, -100.0);
        assert_eq!(profile.voice_type, "Unknown");
        assert_eq!(profile.description, "Indeterminate Range");
        assert!(!profile.has_loudness());
    }

    #[test]
    fn envelope_is_a_copy() {
        let mut stats = synthetic_stats();
        let profile = record_profile(&stats, "Ada", 1, String::new());
        stats.hold_peaks(&[255, 255, 255, 255]);
        assert_eq!(profile.spectrum_envelope, vec![10, 200, 35, 0]);
    }

    #[test]
    fn serializes_export_shape() {
        let profile = record_profile(&synthetic_stats(), "Ada", 42, "1/2/2025, 10:00:00".into());
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 42,
                "name": "Ada",
                "voiceType": "Baritone",
                "description": "Rich, Warm & Smooth",
                "avgFreq": 120,
                "avgDb": "-12.3",
                "maxDb": "-3.4",
                "date": "1/2/2025, 10:00:00",
                "spectrumData": [10, 200, 35, 0],
            })
        );

        let silent = record_profile(&SessionStats::new(1), "", 7, String::new());
        let value = serde_json::to_value(&silent).unwrap();
        assert_eq!(value["avgDb"], json!(-100));
        assert_eq!(value["maxDb"], json!("-100.0"));
    }

    #[test]
    fn saved_average_matches_fixed_decimal_rounding() {
        let mut stats = SessionStats::new(1);
        stats.db_sum = -31.2 + -10.1;
        stats.db_count = 2;
        stats.max_db = -10.1;
        let profile = record_profile(&stats, "Ada", 3, String::new());
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["avgDb"], json!("-20.6"));
        assert_eq!(value["maxDb"], json!("-10.1"));
    }

    #[test]
    fn reads_legacy_records() {
        let raw = r#"{
            "id": 1714000000000,
            "name": "Old",
            "voiceType": "Countertenor",
            "avgFreq": 300,
            "avgDb": -100,
            "maxDb": "-8.0",
            "date": "4/25/2024, 9:00:00 AM",
            "spectrumData": [1, 2, 3]
        }"#;
        let profile: VoiceProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.avg_db, -100.0);
        assert_eq!(profile.max_db, -8.0);
        assert_eq!(profile.description, "");
        assert_eq!(profile.display_description(), tuning::GENERIC_DESCRIPTION);
    }

    #[test]
    fn summary_matches_recorded_profile() {
        let stats = synthetic_stats();
        let summary = ProfileSummary::from_stats(&stats);
        let profile = record_profile(&stats, "Ada", 1, String::new());
        assert_eq!(summary.voice_type.as_str(), profile.voice_type);
        assert_eq!(summary.avg_freq, profile.avg_freq);
        assert_eq!(summary.avg_db, profile.avg_db);
        assert_eq!(summary.max_db, profile.max_db);
    }
}
