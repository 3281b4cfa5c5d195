//! # Session Controller Module
//!
//! The state machine a front end drives: start, pause, resume, stop, reset,
//! save. It owns the frame source and the session aggregator and runs one
//! loop step per displayed frame.
//!
//! ## Transitions
//! - `start`: Idle or Stopped → Listening (statistics reset); Paused → Listening (resume)
//! - `pause`/`resume`: Listening ⇄ Paused, statistics kept
//! - `stop`: Listening or Paused → Stopped, statistics kept, saving enabled
//! - `reset`: any → Idle, statistics cleared

use std::fmt;
use std::time::Duration;

use crate::error::VoiceError;
use crate::profile::{self, ProfileSummary, VoiceProfile};
use crate::render::Renderer;
use crate::session::{SessionAggregator, SessionStats, STATS_INTERVAL};
use crate::source::{FrameSource, SpectralFrame};
use crate::store::{KeyValueStore, ProfileStore};
use crate::ClassifiedSample;

/// Lifecycle state of an analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
    Paused,
    Stopped,
}

impl SessionState {
    /// Status text shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "READY",
            SessionState::Listening => "LISTENING",
            SessionState::Paused => "PAUSED",
            SessionState::Stopped => "ANALYSIS COMPLETE",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Drives a [`FrameSource`] through the analysis session lifecycle.
pub struct SessionController<S: FrameSource> {
    source: S,
    aggregator: SessionAggregator,
    state: SessionState,
}

impl<S: FrameSource> SessionController<S> {
    pub fn new(source: S) -> Self {
        Self::with_interval(source, STATS_INTERVAL)
    }

    /// Creates a controller whose statistics update at most once per `interval`.
    pub fn with_interval(source: S, interval: Duration) -> Self {
        let bins = source.bin_count();
        Self {
            source,
            aggregator: SessionAggregator::with_interval(bins, interval),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> &SessionStats {
        self.aggregator.stats()
    }

    pub fn readout(&self) -> Option<&ClassifiedSample> {
        self.aggregator.readout()
    }

    /// Saving is only offered once a session has been stopped.
    pub fn can_save(&self) -> bool {
        self.state == SessionState::Stopped
    }

    fn refuse(&self, action: &'static str) -> VoiceError {
        log::warn!("refusing to {action} while {}", self.state);
        VoiceError::InvalidTransition {
            action,
            state: self.state,
        }
    }

    /// Starts a new session, or resumes a paused one.
    ///
    /// A failing source leaves the controller in its previous state.
    pub fn start(&mut self) -> Result<(), VoiceError> {
        match self.state {
            SessionState::Paused => self.resume(),
            SessionState::Idle | SessionState::Stopped => {
                self.source.init()?;
                self.source.resume();
                self.aggregator.reset_with_bins(self.source.bin_count());
                self.state = SessionState::Listening;
                log::info!("session started");
                Ok(())
            }
            SessionState::Listening => Err(self.refuse("start")),
        }
    }

    pub fn pause(&mut self) -> Result<(), VoiceError> {
        if self.state != SessionState::Listening {
            return Err(self.refuse("pause"));
        }
        self.source.suspend();
        self.state = SessionState::Paused;
        log::info!("session paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), VoiceError> {
        if self.state != SessionState::Paused {
            return Err(self.refuse("resume"));
        }
        self.source.resume();
        self.state = SessionState::Listening;
        log::info!("session resumed");
        Ok(())
    }

    /// Pauses a listening session or resumes a paused one.
    pub fn toggle_pause(&mut self) -> Result<(), VoiceError> {
        match self.state {
            SessionState::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Ends the session, keeping its statistics for saving.
    pub fn stop(&mut self) -> Result<(), VoiceError> {
        match self.state {
            SessionState::Listening | SessionState::Paused => {
                self.source.suspend();
                self.state = SessionState::Stopped;
                log::info!("session stopped");
                Ok(())
            }
            SessionState::Idle | SessionState::Stopped => Err(self.refuse("stop")),
        }
    }

    /// Stops whatever is running and clears all statistics.
    pub fn reset(&mut self) {
        if matches!(self.state, SessionState::Listening | SessionState::Paused) {
            self.source.suspend();
        }
        self.aggregator.reset_with_bins(self.source.bin_count());
        self.state = SessionState::Idle;
        log::info!("session reset");
    }

    /// Runs one loop iteration.
    ///
    /// Pulls the latest frames, forwards them to `renderer` and feeds the
    /// spectrum to the aggregator. Does nothing unless listening or while
    /// the source has no frame yet.
    ///
    /// # Arguments
    /// * `renderer` - Drawing collaborator for the live views
    /// * `now` - Session time, used to throttle statistics updates
    ///
    /// # Returns
    /// * The new readout when this step updated the statistics
    pub fn tick(&mut self, renderer: &mut impl Renderer, now: Duration) -> Option<ClassifiedSample> {
        if self.state != SessionState::Listening {
            return None;
        }

        let time = self.source.time_domain_frame();
        let magnitudes = self.source.magnitude_frame();

        if let Some(time) = &time {
            renderer.draw_waveform(time);
        }
        let magnitudes = magnitudes?;
        renderer.draw_spectrum(&magnitudes);

        let frame = SpectralFrame {
            time: time.unwrap_or_default(),
            magnitudes,
        };
        self.aggregator.step(&frame, self.source.layout(), now)
    }

    /// The values a save would record, for the confirmation prompt.
    pub fn preview(&self) -> ProfileSummary {
        ProfileSummary::from_stats(self.aggregator.stats())
    }

    /// Records the stopped session as a profile and stores it.
    ///
    /// # Arguments
    /// * `store` - Destination collection
    /// * `name` - Subject name; blank becomes "Anonymous"
    /// * `now_ms` - Current time in milliseconds, the basis for the profile id
    /// * `created_at` - Display timestamp
    /// * `confirm` - Asked with the preview; declining saves nothing
    ///
    /// # Returns
    /// * `Ok(Some(profile))` - Saved profile
    /// * `Ok(None)` - Declined
    pub fn save_profile<B: KeyValueStore>(
        &self,
        store: &mut ProfileStore<B>,
        name: &str,
        now_ms: u64,
        created_at: String,
        confirm: impl FnOnce(&ProfileSummary) -> bool,
    ) -> Result<Option<VoiceProfile>, VoiceError> {
        if !self.can_save() {
            return Err(self.refuse("save"));
        }
        if !confirm(&self.preview()) {
            log::info!("save declined");
            return Ok(None);
        }

        let id = store.next_id(now_ms)?;
        let profile = profile::record_profile(self.aggregator.stats(), name, id, created_at);
        store.save(profile.clone())?;
        Ok(Some(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawMode, SpectrumLayer};
    use crate::store::MemoryStore;
    use crate::VoiceType;
    use anyhow::anyhow;

    /// Scripted source: fails init on demand, replays a fixed spectrum.
    struct FakeSource {
        fail_init: bool,
        initialized: bool,
        suspended: bool,
        spectrum: Vec<u8>,
    }

    impl FakeSource {
        fn with_peak(bin: usize, value: u8) -> Self {
            let mut spectrum = vec![0u8; 1024];
            spectrum[bin] = value;
            Self {
                fail_init: false,
                initialized: false,
                suspended: false,
                spectrum,
            }
        }
    }

    impl FrameSource for FakeSource {
        fn init(&mut self) -> Result<(), VoiceError> {
            if self.fail_init {
                return Err(VoiceError::SourceInit(anyhow!("permission denied")));
            }
            self.initialized = true;
            Ok(())
        }

        fn time_domain_frame(&mut self) -> Option<Vec<f32>> {
            self.initialized.then(|| vec![0.0; 1024])
        }

        fn magnitude_frame(&mut self) -> Option<Vec<u8>> {
            self.initialized.then(|| self.spectrum.clone())
        }

        fn sample_rate(&self) -> f32 {
            48_000.0
        }

        fn fft_size(&self) -> usize {
            2048
        }

        fn suspend(&mut self) {
            self.suspended = true;
        }

        fn resume(&mut self) {
            self.suspended = false;
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        waveforms: usize,
        spectra: usize,
    }

    impl Renderer for CountingRenderer {
        fn draw_waveform(&mut self, _samples: &[f32]) {
            self.waveforms += 1;
        }

        fn draw_spectrum(&mut self, _magnitudes: &[u8]) {
            self.spectra += 1;
        }

        fn draw_comparison(&mut self, _mode: DrawMode, _layers: &[SpectrumLayer<'_>]) {}
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn failed_init_stays_idle() {
        let mut source = FakeSource::with_peak(10, 200);
        source.fail_init = true;
        let mut controller = SessionController::new(source);
        assert!(matches!(controller.start(), Err(VoiceError::SourceInit(_))));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn lifecycle_transitions() {
        let mut controller = SessionController::new(FakeSource::with_peak(10, 200));
        assert!(controller.pause().is_err());
        assert!(controller.stop().is_err());

        controller.start().unwrap();
        assert_eq!(controller.state(), SessionState::Listening);
        assert!(controller.start().is_err());

        controller.toggle_pause().unwrap();
        assert_eq!(controller.state(), SessionState::Paused);
        assert!(controller.source().suspended);

        // Start while paused resumes.
        controller.start().unwrap();
        assert_eq!(controller.state(), SessionState::Listening);
        assert!(!controller.source().suspended);

        controller.stop().unwrap();
        assert_eq!(controller.state(), SessionState::Stopped);
        assert!(controller.can_save());
        assert!(controller.resume().is_err());

        controller.reset();
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!controller.can_save());
    }

    #[test]
    fn tick_runs_only_while_listening() {
        let mut controller = SessionController::new(FakeSource::with_peak(10, 200));
        let mut renderer = CountingRenderer::default();
        assert!(controller.tick(&mut renderer, ms(0)).is_none());
        assert_eq!(renderer.spectra, 0);

        controller.start().unwrap();
        let sample = controller.tick(&mut renderer, ms(0)).unwrap();
        assert_eq!(sample.frequency_hz, 234);
        assert_eq!(sample.voice_type, VoiceType::Tenor);
        assert!(controller.tick(&mut renderer, ms(16)).is_none());
        assert_eq!(renderer.waveforms, 2);
        assert_eq!(renderer.spectra, 2);

        controller.pause().unwrap();
        assert!(controller.tick(&mut renderer, ms(500)).is_none());
        assert_eq!(renderer.spectra, 2);
    }

    #[test]
    fn pause_preserves_statistics() {
        let mut controller = SessionController::new(FakeSource::with_peak(10, 200));
        let mut renderer = CountingRenderer::default();
        controller.start().unwrap();
        controller.tick(&mut renderer, ms(0));
        controller.tick(&mut renderer, ms(100));

        controller.pause().unwrap();
        controller.resume().unwrap();
        assert_eq!(controller.stats().frequency_count, 2);

        controller.tick(&mut renderer, ms(200));
        controller.stop().unwrap();
        assert_eq!(controller.stats().frequency_count, 3);
        assert_eq!(controller.stats().max_hold[10], 200);
    }

    #[test]
    fn restarting_after_stop_begins_fresh() {
        let mut controller = SessionController::new(FakeSource::with_peak(10, 200));
        let mut renderer = CountingRenderer::default();
        controller.start().unwrap();
        controller.tick(&mut renderer, ms(0));
        controller.stop().unwrap();

        controller.start().unwrap();
        assert_eq!(controller.stats().frequency_count, 0);
        assert_eq!(controller.stats().max_hold[10], 0);
    }

    #[test]
    fn save_requires_stop_and_confirmation() {
        let mut controller = SessionController::new(FakeSource::with_peak(10, 200));
        let mut renderer = CountingRenderer::default();
        let mut store = ProfileStore::new(MemoryStore::default());

        controller.start().unwrap();
        controller.tick(&mut renderer, ms(0));
        assert!(matches!(
            controller.save_profile(&mut store, "Ada", 1_000, "now".into(), |_| true),
            Err(VoiceError::InvalidTransition { action: "save", .. })
        ));

        controller.stop().unwrap();
        let declined = controller
            .save_profile(&mut store, "Ada", 1_000, "now".into(), |_| false)
            .unwrap();
        assert!(declined.is_none());
        assert!(store.load().unwrap().is_empty());

        let saved = controller
            .save_profile(&mut store, "Ada", 1_000, "now".into(), |preview| {
                preview.voice_type == VoiceType::Tenor && preview.avg_freq == 234
            })
            .unwrap()
            .unwrap();
        assert_eq!(saved.id, 1_000);
        assert_eq!(saved.spectrum_envelope[10], 200);
        assert_eq!(store.load().unwrap(), vec![saved]);

        // Saving leaves the stopped session's statistics in place.
        assert_eq!(controller.stats().frequency_count, 1);
    }
}
