//! # Audio Capture Module
//!
//! This module handles real-time microphone capture using CPAL (Cross-Platform Audio Library)
//! and exposes it as a [`FrameSource`].
//!
//! ## Features
//! - Automatic input device and stream format selection
//! - Lock-free hand-off from the audio callback through a bounded channel
//! - Sliding sample window feeding the [`Analyser`]
//! - Suspend and resume without tearing down the stream

use std::collections::VecDeque;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::{Receiver, Sender};

use crate::error::VoiceError;
use crate::fft::{Analyser, AnalyserSettings};
use crate::source::FrameSource;

/// Sample rate requested from the input device.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Capacity of the callback-to-analysis channel, in callback chunks.
const CHANNEL_CAPACITY: usize = 64;

/// A running input stream and its negotiated sample rate.
pub struct Capture {
    pub stream: cpal::Stream,
    pub sample_rate: u32,
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks an `f32` stream format close to [`TARGET_SAMPLE_RATE`], preferring mono
/// 3. Forwards every callback chunk (first channel only) through `sender`
///
/// Chunks are dropped rather than blocking the audio thread when the
/// consumer falls behind.
///
/// # Arguments
/// * `sender` - Channel sender for streaming mono samples to the analysis side
///
/// # Returns
/// * `Ok(Capture)` - Playing stream handle and sample rate
/// * `Err(e)` - No device, no usable format, or the stream failed to start
pub fn start_audio_capture(sender: Sender<Vec<f32>>) -> Result<Capture> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!(
        "using audio input device: {}",
        device.name().unwrap_or_else(|_| "<unnamed>".to_string())
    );

    let configs = device
        .supported_input_configs()
        .context("querying input configurations")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = TARGET_SAMPLE_RATE.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let channels = usize::from(config.channels()).max(1);
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    log::info!("selected sample rate: {sample_rate} Hz, {channels} channel(s)");

    let err_fn = |err| log::error!("audio stream error: {err}");

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data.iter().step_by(channels).copied().collect();
                // Dropping a chunk is preferable to stalling the audio thread.
                let _ = sender.try_send(mono);
            },
            err_fn,
            None,
        )
        .context("building input stream")?;

    stream.play().context("starting input stream")?;

    Ok(Capture { stream, sample_rate })
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only `f32` formats qualify. Among those, fewer channels win first, then
/// the range closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let distance = if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            };
            (c.channels(), distance)
        })
}

/// Keeps the newest `capacity` samples.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::from(vec![0.0; capacity]),
            capacity,
        }
    }

    pub fn extend(&mut self, chunk: &[f32]) {
        self.samples.extend(chunk.iter().copied());
        let excess = self.samples.len().saturating_sub(self.capacity);
        self.samples.drain(..excess);
    }

    /// The newest `len` samples, oldest first.
    pub fn latest(&self, len: usize) -> Vec<f32> {
        let skip = self.samples.len().saturating_sub(len);
        self.samples.iter().skip(skip).copied().collect()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }
}

/// The default microphone as a [`FrameSource`].
///
/// Nothing is opened until [`FrameSource::init`] runs; until then both frame
/// getters return `None`.
pub struct MicrophoneSource {
    settings: AnalyserSettings,
    capture: Option<Capture>,
    receiver: Option<Receiver<Vec<f32>>>,
    window: SampleWindow,
    analyser: Analyser,
}

impl MicrophoneSource {
    pub fn new(settings: AnalyserSettings) -> Self {
        Self {
            settings,
            capture: None,
            receiver: None,
            window: SampleWindow::new(settings.fft_size),
            analyser: Analyser::new(settings),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.capture.is_some()
    }

    /// Moves everything the audio callback produced into the sample window.
    fn drain_pending(&mut self) {
        if let Some(receiver) = &self.receiver {
            while let Ok(chunk) = receiver.try_recv() {
                self.window.extend(&chunk);
            }
        }
    }
}

impl Default for MicrophoneSource {
    fn default() -> Self {
        Self::new(AnalyserSettings::default())
    }
}

impl FrameSource for MicrophoneSource {
    fn init(&mut self) -> Result<(), VoiceError> {
        if self.is_initialized() {
            return Ok(());
        }

        let (sender, receiver) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let capture = start_audio_capture(sender).map_err(VoiceError::SourceInit)?;
        log::info!("microphone capture started at {} Hz", capture.sample_rate);

        self.capture = Some(capture);
        self.receiver = Some(receiver);
        Ok(())
    }

    fn time_domain_frame(&mut self) -> Option<Vec<f32>> {
        if !self.is_initialized() {
            return None;
        }
        self.drain_pending();
        Some(self.window.latest(self.bin_count()))
    }

    fn magnitude_frame(&mut self) -> Option<Vec<u8>> {
        if !self.is_initialized() {
            return None;
        }
        self.drain_pending();
        Some(self.analyser.byte_frequency_data(&self.window.to_vec()))
    }

    fn sample_rate(&self) -> f32 {
        self.capture
            .as_ref()
            .map_or(TARGET_SAMPLE_RATE, |c| c.sample_rate) as f32
    }

    fn fft_size(&self) -> usize {
        self.settings.fft_size
    }

    fn suspend(&mut self) {
        if let Some(capture) = &self.capture {
            if let Err(e) = capture.stream.pause() {
                log::warn!("error pausing input stream: {e}");
            }
        }
    }

    fn resume(&mut self) {
        if let Some(capture) = &self.capture {
            if let Err(e) = capture.stream.play() {
                log::warn!("error resuming input stream: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_newest_samples() {
        let mut window = SampleWindow::new(4);
        window.extend(&[1.0, 2.0, 3.0]);
        assert_eq!(window.to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        window.extend(&[4.0, 5.0, 6.0]);
        assert_eq!(window.to_vec(), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(window.latest(2), vec![5.0, 6.0]);
        assert_eq!(window.latest(10).len(), 4);
    }

    #[test]
    fn uninitialized_source_has_no_frames() {
        let mut source = MicrophoneSource::default();
        assert!(!source.is_initialized());
        assert!(source.time_domain_frame().is_none());
        assert!(source.magnitude_frame().is_none());
        assert_eq!(source.fft_size(), 2048);
        assert_eq!(source.bin_count(), 1024);
    }
}
