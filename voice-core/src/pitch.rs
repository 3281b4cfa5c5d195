//! # Pitch & Loudness Module
//!
//! This module turns a byte magnitude spectrum into the two instantaneous
//! readings the voice analyser displays: the dominant frequency and the peak
//! loudness. Both work on precomputed spectra and never touch raw audio.
//!
//! ## Features
//! - Peak-bin pitch estimation restricted to the human voice band
//! - Noise floor gating so silence and hiss report no pitch
//! - Peak loudness in dBFS with a fixed silence sentinel

/// Lowest frequency (Hz) considered when searching for the dominant pitch.
pub const VOICE_BAND_MIN_HZ: f32 = 50.0;

/// Upper bound (Hz, exclusive) of the dominant pitch search.
pub const VOICE_BAND_MAX_HZ: f32 = 3000.0;

/// Magnitudes below this value (out of 255) are treated as the noise floor.
pub const NOISE_FLOOR: u8 = 30;

/// Loudness reported for a completely silent spectrum.
pub const SILENCE_DB: f64 = -100.0;

/// Full-scale magnitude of a byte spectrum.
const FULL_SCALE: f64 = 255.0;

/// Width of a single frequency bin in Hz.
pub fn bin_size(sample_rate: f32, fft_size: usize) -> f32 {
    sample_rate / fft_size as f32
}

/// Finds the dominant frequency of a byte magnitude spectrum.
///
/// Only bins mapping to the 50 Hz to 3000 Hz voice band are searched, so
/// low rumble or high hiss never wins even when it holds the spectrum's
/// global maximum. The first bin holding the maximum wins.
///
/// # Arguments
/// * `magnitudes` - Byte spectrum, one value (0-255) per bin
/// * `sample_rate` - Sample rate in Hz
/// * `fft_size` - FFT length the spectrum was computed with
///
/// # Returns
/// * Dominant frequency rounded to whole Hz, or `0` when nothing rises above
///   the noise floor
pub fn detect_dominant_frequency(magnitudes: &[u8], sample_rate: f32, fft_size: usize) -> u32 {
    let bin_size = bin_size(sample_rate, fft_size);
    if !bin_size.is_finite() || bin_size <= 0.0 {
        return 0;
    }

    let min_bin = (VOICE_BAND_MIN_HZ / bin_size).floor() as usize;
    let max_bin = ((VOICE_BAND_MAX_HZ / bin_size).floor() as usize).min(magnitudes.len());
    if min_bin >= max_bin {
        return 0;
    }

    let mut peak: Option<(usize, u8)> = None;
    for (offset, &value) in magnitudes[min_bin..max_bin].iter().enumerate() {
        if peak.is_none_or(|(_, best)| value > best) {
            peak = Some((min_bin + offset, value));
        }
    }

    match peak {
        Some((index, value)) if value >= NOISE_FLOOR => (index as f32 * bin_size).round() as u32,
        _ => 0,
    }
}

/// Estimates the peak loudness of a byte spectrum in dB relative to full scale.
///
/// Returns exactly [`SILENCE_DB`] when every bin is zero, otherwise
/// `20 * log10(max / 255)` rounded to one decimal place.
pub fn estimate_peak_db(magnitudes: &[u8]) -> f64 {
    let max = magnitudes.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return SILENCE_DB;
    }
    round_tenths(20.0 * (f64::from(max) / FULL_SCALE).log10())
}

/// Rounds a value to one decimal place, the precision used for every dB reading.
///
/// Rounding works on the exact binary value, with halves going away from zero.
/// Scaling by ten first is not enough: `20.65` is stored as `20.6499...`, but
/// `20.65 * 10.0` comes out as exactly `206.5`.
pub fn round_tenths(value: f64) -> f64 {
    // Past 2^52 every double is already an integer.
    if !value.is_finite() || value.abs() >= 4_503_599_627_370_496.0 {
        return value;
    }
    (tenths_half_up(value.abs()) as f64 / 10.0).copysign(value)
}

/// `floor(magnitude * 10 + 0.5)` computed on the exact mantissa and exponent.
fn tenths_half_up(magnitude: f64) -> u64 {
    let bits = magnitude.to_bits();
    let biased_exponent = ((bits >> 52) & 0x7ff) as i32;
    if biased_exponent == 0 {
        // zero or subnormal
        return 0;
    }
    let mantissa = u128::from((bits & ((1 << 52) - 1)) | (1 << 52));
    // magnitude == mantissa * 2^-shift, and shift > 0 below 2^52
    let shift = (1075 - biased_exponent) as u32;
    if shift >= 128 {
        return 0;
    }
    let half = 1u128 << (shift - 1);
    ((mantissa * 10 + half) >> shift) as u64
}
