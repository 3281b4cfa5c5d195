// voice-core/src/lib.rs

//! The core logic for the Voiceprint voice analyser.
//! This crate turns a stream of spectral frames into live pitch and loudness
//! readings, folds them into session statistics and persists comparable
//! voice profiles. It is completely headless and contains no drawing code.

pub mod audio;
pub mod compare;
pub mod controller;
pub mod error;
pub mod fft;
pub mod pitch;
pub mod profile;
pub mod render;
pub mod session;
pub mod source;
pub mod store;
pub mod tuning;

pub use error::VoiceError;
pub use source::{BinLayout, FrameSource, SpectralFrame};
pub use tuning::VoiceType;

/// The classification of a single spectral frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSample {
    /// Dominant frequency in whole Hz; `0` when no pitch was detected.
    pub frequency_hz: u32,
    /// Peak loudness in dB, one decimal; `-100` for silence.
    pub peak_db: f64,
    /// Nearest note name, or `"-"` when there is no pitch.
    pub note: String,
    pub voice_type: VoiceType,
}

impl ClassifiedSample {
    /// Runs the full frame classifier over a byte magnitude spectrum.
    pub fn classify(magnitudes: &[u8], layout: BinLayout) -> Self {
        let frequency_hz =
            pitch::detect_dominant_frequency(magnitudes, layout.sample_rate, layout.fft_size);
        Self {
            frequency_hz,
            peak_db: pitch::estimate_peak_db(magnitudes),
            note: tuning::classify_note(frequency_hz as f32),
            voice_type: tuning::classify_voice_type(frequency_hz as f32),
        }
    }

    /// Whether a pitch rose above the noise floor in this frame.
    pub fn has_pitch(&self) -> bool {
        self.frequency_hz > 0
    }
}
