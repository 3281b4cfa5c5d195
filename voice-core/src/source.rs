//! # Frame Source Module
//!
//! The contract between the analysis core and whatever produces audio frames.
//! A frame source hands out the latest time-domain samples and the latest
//! byte magnitude spectrum on demand; it never blocks.

use crate::error::VoiceError;
use crate::pitch;

/// One audio frame as seen by the analysis core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralFrame {
    /// Time-domain samples in the range -1.0..=1.0.
    pub time: Vec<f32>,
    /// Byte magnitudes (0-255), one per frequency bin.
    pub magnitudes: Vec<u8>,
}

/// Maps bin indices to frequencies for a given sample rate and FFT length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLayout {
    pub sample_rate: f32,
    pub fft_size: usize,
}

impl BinLayout {
    pub fn new(sample_rate: f32, fft_size: usize) -> Self {
        Self { sample_rate, fft_size }
    }

    /// Width of one bin in Hz.
    pub fn bin_size(&self) -> f32 {
        pitch::bin_size(self.sample_rate, self.fft_size)
    }

    /// Number of usable bins (half the FFT length).
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Centre frequency of a bin in Hz.
    pub fn frequency_of(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_size()
    }
}

/// A provider of spectral frames.
///
/// Both frame getters return `None` until [`FrameSource::init`] has succeeded.
/// Callers treat an absent frame as "nothing to do this iteration".
pub trait FrameSource {
    /// Prepares the source. Calling it again after success is a no-op.
    fn init(&mut self) -> Result<(), VoiceError>;

    /// Latest time-domain samples.
    fn time_domain_frame(&mut self) -> Option<Vec<f32>>;

    /// Latest byte magnitude spectrum.
    fn magnitude_frame(&mut self) -> Option<Vec<u8>>;

    fn sample_rate(&self) -> f32;

    fn fft_size(&self) -> usize;

    fn bin_count(&self) -> usize {
        self.fft_size() / 2
    }

    fn layout(&self) -> BinLayout {
        BinLayout::new(self.sample_rate(), self.fft_size())
    }

    /// Stops delivering new audio without discarding the source.
    fn suspend(&mut self) {}

    /// Restarts delivery after [`FrameSource::suspend`].
    fn resume(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_maps_bins_to_hz() {
        let layout = BinLayout::new(44_100.0, 2048);
        assert_eq!(layout.bin_count(), 1024);
        assert!((layout.bin_size() - 21.533_203).abs() < 1e-4);
        assert!((layout.frequency_of(20) - 430.664).abs() < 1e-2);
    }
}
