//! # Session Aggregation Module
//!
//! Folds the continuous stream of spectral frames into session-long statistics.
//!
//! Two cadences run against the same frames:
//! - every frame updates the per-bin max-hold envelope
//! - at most once per stats interval the frame is classified and folded into
//!   the running frequency, loudness and voice-type statistics
//!
//! Statistics survive pause and resume; only [`SessionAggregator::reset`]
//! clears them.

use std::time::Duration;

use crate::pitch::{self, SILENCE_DB};
use crate::source::{BinLayout, SpectralFrame};
use crate::tuning::VoiceType;
use crate::ClassifiedSample;

/// Default interval between statistics updates.
pub const STATS_INTERVAL: Duration = Duration::from_millis(100);

/// Rate limiter over injected session time.
///
/// Fires when at least `interval` has passed since the last time it fired.
/// The first check after a restart always fires. The reference point moves
/// to the actual firing time, so slow frames stretch the gap instead of
/// building up a backlog.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Duration>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` and records `now` if the interval has elapsed.
    pub fn ready(&mut self, now: Duration) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }

    pub fn restart(&mut self) {
        self.last = None;
    }
}

/// Voice-type counts kept in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceTypeHistogram {
    buckets: Vec<(VoiceType, u32)>,
}

impl VoiceTypeHistogram {
    pub fn record(&mut self, voice: VoiceType) {
        match self.buckets.iter_mut().find(|(v, _)| *v == voice) {
            Some((_, count)) => *count += 1,
            None => self.buckets.push((voice, 1)),
        }
    }

    pub fn count(&self, voice: VoiceType) -> u32 {
        self.buckets
            .iter()
            .find(|(v, _)| *v == voice)
            .map_or(0, |&(_, count)| count)
    }

    /// Buckets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (VoiceType, u32)> + '_ {
        self.buckets.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The bucket with the strictly greatest count.
    ///
    /// Ties go to the bucket that was created first. An empty histogram
    /// yields [`VoiceType::Unknown`].
    pub fn dominant(&self) -> VoiceType {
        let mut best = VoiceType::Unknown;
        let mut best_count = 0;
        for (voice, count) in self.iter() {
            if count > best_count {
                best = voice;
                best_count = count;
            }
        }
        best
    }
}

/// Running statistics of one analysis session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// Sum of detected frequencies in whole Hz.
    pub frequency_sum: u64,
    pub frequency_count: u32,
    pub db_sum: f64,
    pub db_count: u32,
    /// Loudest reading seen, `-100` until something is heard.
    pub max_db: f64,
    pub voice_types: VoiceTypeHistogram,
    /// Per-bin running maximum of every magnitude observed.
    pub max_hold: Vec<u8>,
}

impl SessionStats {
    pub fn new(bin_count: usize) -> Self {
        Self {
            frequency_sum: 0,
            frequency_count: 0,
            db_sum: 0.0,
            db_count: 0,
            max_db: SILENCE_DB,
            voice_types: VoiceTypeHistogram::default(),
            max_hold: vec![0; bin_count],
        }
    }

    /// Raises each max-hold slot to the matching magnitude.
    ///
    /// Bins beyond the shorter of the two buffers are left untouched.
    pub fn hold_peaks(&mut self, magnitudes: &[u8]) {
        for (held, &value) in self.max_hold.iter_mut().zip(magnitudes) {
            if value > *held {
                *held = value;
            }
        }
    }

    /// Folds one classified sample into the running statistics.
    ///
    /// Unpitched samples only contribute to the peak loudness.
    pub fn record(&mut self, sample: &ClassifiedSample) {
        if sample.has_pitch() {
            self.frequency_sum += u64::from(sample.frequency_hz);
            self.frequency_count += 1;
            self.voice_types.record(sample.voice_type);

            if sample.peak_db > SILENCE_DB {
                self.db_sum += sample.peak_db;
                self.db_count += 1;
            }
        }

        if sample.peak_db > self.max_db {
            self.max_db = sample.peak_db;
        }
    }

    /// Mean detected frequency rounded to whole Hz, `0` when nothing was detected.
    pub fn average_frequency(&self) -> u32 {
        if self.frequency_count == 0 {
            return 0;
        }
        (self.frequency_sum as f64 / f64::from(self.frequency_count)).round() as u32
    }

    /// Mean loudness to one decimal, `-100` when nothing was measured.
    pub fn average_db(&self) -> f64 {
        if self.db_count == 0 {
            return SILENCE_DB;
        }
        pitch::round_tenths(self.db_sum / f64::from(self.db_count))
    }

    pub fn dominant_voice_type(&self) -> VoiceType {
        self.voice_types.dominant()
    }
}

/// Owner of a session's statistics and its update cadence.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    stats: SessionStats,
    throttle: Throttle,
    readout: Option<ClassifiedSample>,
}

impl SessionAggregator {
    pub fn new(bin_count: usize) -> Self {
        Self::with_interval(bin_count, STATS_INTERVAL)
    }

    pub fn with_interval(bin_count: usize, interval: Duration) -> Self {
        Self {
            stats: SessionStats::new(bin_count),
            throttle: Throttle::new(interval),
            readout: None,
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The latest throttled classification, for display.
    pub fn readout(&self) -> Option<&ClassifiedSample> {
        self.readout.as_ref()
    }

    /// Clears all statistics, keeping the current bin count.
    pub fn reset(&mut self) {
        let bins = self.stats.max_hold.len();
        self.reset_with_bins(bins);
    }

    /// Clears all statistics and resizes the max-hold envelope.
    pub fn reset_with_bins(&mut self, bin_count: usize) {
        self.stats = SessionStats::new(bin_count);
        self.throttle.restart();
        self.readout = None;
    }

    /// Processes one frame.
    ///
    /// The max-hold envelope is updated unconditionally. When the throttle
    /// allows it the frame is also classified and folded into the statistics,
    /// and the new classification is returned.
    pub fn step(
        &mut self,
        frame: &SpectralFrame,
        layout: BinLayout,
        now: Duration,
    ) -> Option<ClassifiedSample> {
        self.stats.hold_peaks(&frame.magnitudes);

        if !self.throttle.ready(now) {
            return None;
        }

        let sample = ClassifiedSample::classify(&frame.magnitudes, layout);
        self.stats.record(&sample);
        log::debug!(
            "readout: {} Hz, {} ({}), {:.1} dB",
            sample.frequency_hz,
            sample.note,
            sample.voice_type,
            sample.peak_db
        );
        self.readout = Some(sample.clone());
        Some(sample)
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn max_hold_never_decreases(
            frames in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 64),
                1..32,
            ),
        ) {
            let mut stats = SessionStats::new(64);
            let mut previous = stats.max_hold.clone();
            for frame in &frames {
                stats.hold_peaks(frame);
                for (i, (&now, &before)) in stats.max_hold.iter().zip(&previous).enumerate() {
                    prop_assert!(now >= before, "slot {} dropped {} -> {}", i, before, now);
                    prop_assert!(now >= frame[i]);
                }
                previous = stats.max_hold.clone();
            }
        }
    }
}
