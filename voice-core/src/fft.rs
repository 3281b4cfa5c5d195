//! # Spectrum Analyser Module
//!
//! This module turns raw time-domain samples into the byte magnitude spectrum
//! the rest of the crate consumes. It follows the behaviour of a browser
//! analyser node so profiles recorded anywhere compare like for like.
//!
//! ## Features
//! - High-performance FFT using RustFFT, planned once per analyser
//! - Blackman windowing for reduced spectral leakage
//! - Exponential smoothing across successive frames
//! - dB scaling into a 0-255 byte range

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// FFT length used for all live analysis.
pub const FFT_SIZE: usize = 2048;

/// Tuning knobs of the analyser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    /// Weight of the previous frame in the smoothed magnitude (0.0-1.0).
    pub smoothing: f32,
    /// dB value mapped to byte 0.
    pub min_decibels: f32,
    /// dB value mapped to byte 255.
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: FFT_SIZE,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Produces smoothed byte spectra from successive sample windows.
pub struct Analyser {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl std::fmt::Debug for Analyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyser")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Analyser {
    pub fn new(settings: AnalyserSettings) -> Self {
        let n = settings.fft_size;
        let mut planner = FftPlanner::new();
        Self {
            settings,
            fft: planner.plan_fft_forward(n),
            window: blackman_window(n),
            smoothed: vec![0.0; n / 2],
            buffer: vec![Complex { re: 0.0, im: 0.0 }; n],
        }
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }

    pub fn bin_count(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// Forgets the smoothing history.
    pub fn clear(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Computes the byte magnitude spectrum of the most recent samples.
    ///
    /// The last `fft_size` samples are analysed; shorter input is padded
    /// with leading zeros. Each call advances the smoothing state.
    ///
    /// # Returns
    /// * `Vec<u8>` - One value per bin, `fft_size / 2` long
    pub fn byte_frequency_data(&mut self, samples: &[f32]) -> Vec<u8> {
        let n = self.settings.fft_size;
        let recent = &samples[samples.len().saturating_sub(n)..];
        let pad = n - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex { re: sample * self.window[i], im: 0.0 };
        }
        self.fft.process(&mut self.buffer);

        let tau = self.settings.smoothing.clamp(0.0, 1.0);
        let scale = 1.0 / n as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.buffer) {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
        }

        let range = self.settings.max_decibels - self.settings.min_decibels;
        self.smoothed
            .iter()
            .map(|&magnitude| {
                if magnitude <= 0.0 || range <= 0.0 {
                    return 0;
                }
                let db = 20.0 * magnitude.log10();
                let scaled = (255.0 / range * (db - self.settings.min_decibels)).floor();
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

/// Blackman window with alpha = 0.16.
fn blackman_window(n: usize) -> Vec<f32> {
    let a0 = 0.42;
    let a1 = 0.5;
    let a2 = 0.08;
    let two_pi = 2.0 * std::f32::consts::PI;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (two_pi * x).cos() + a2 * (2.0 * two_pi * x).cos()
        })
        .collect()
}
