//! # Voiceprint - Terminal Voice Analyser
//!
//! Front end for `voice-core`: drives a live analysis session from the
//! terminal and manages saved voice profiles.
//!
//! ## Architecture
//! - **Main Thread**: session loop, ticking about 60 times per second
//! - **Input Thread**: reads stdin lines and forwards them as commands
//! - **Communication**: Crossbeam channels, multiplexed with `select!`

mod cli;
mod config;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use std::io::{BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use cli::{Cli, Command};
use config::Config;
use render::TerminalRenderer;
use voice_core::{
    audio::MicrophoneSource,
    compare::{self, Selection},
    controller::{SessionController, SessionState},
    profile::ProfileSummary,
    store::{FileStore, ProfileStore},
    ClassifiedSample, VoiceError,
};

/// Loop period, roughly one display frame.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

type Store = ProfileStore<FileStore>;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config = match config::locate_config(cli.config.as_deref()) {
        Some(path) => {
            let cfg = config::load_config(&path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    let store_dir = cli
        .store_dir
        .clone()
        .unwrap_or_else(|| config.storage.resolve_dir());
    log::debug!("profile store at {}", store_dir.display());
    let mut store = ProfileStore::new(FileStore::new(store_dir));

    match cli.command {
        Command::Listen {
            name,
            seconds,
            yes,
            no_save,
            smoothing,
        } => {
            let options = ListenOptions {
                name,
                duration: seconds,
                auto_confirm: yes,
                offer_save: !no_save,
            };
            listen(&config, smoothing, options, &mut store)
        }
        Command::List => list_profiles(&store),
        Command::Delete { id, yes } => delete_profile(&mut store, id, yes),
        Command::Compare { ids } => compare_profiles(&store, &ids),
    }
}

enum LoopEvent {
    Frame,
    Command(String),
    InputClosed,
}

/// A line typed during a live session.
#[derive(Debug, PartialEq)]
enum SessionCommand {
    TogglePause,
    Start,
    Reset,
    Stop,
    Nothing,
    Unknown(String),
}

impl SessionCommand {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "p" => Self::TogglePause,
            "g" => Self::Start,
            "r" => Self::Reset,
            "s" | "q" => Self::Stop,
            "" => Self::Nothing,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Without a time limit, closed stdin leaves nothing that could stop the session.
fn ends_session_on_eof(duration: Option<Duration>) -> bool {
    duration.is_none()
}

/// Stops the session if one is running.
fn finish(controller: &mut SessionController<MicrophoneSource>) {
    if matches!(controller.state(), SessionState::Listening | SessionState::Paused) {
        if let Err(e) = controller.stop() {
            log::warn!("{e}");
        }
    }
}

struct ListenOptions {
    name: Option<String>,
    duration: Option<Duration>,
    auto_confirm: bool,
    offer_save: bool,
}

/// Forwards stdin lines over a channel until stdin closes.
fn spawn_input_reader(sender: Sender<String>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("failed to read stdin: {e}");
                    break;
                }
            }
        }
    });
}

fn print_status(state: SessionState) {
    println!("[{state}]");
}

fn print_readout(sample: &ClassifiedSample, renderer: &TerminalRenderer) {
    let voice = if sample.has_pitch() {
        sample.voice_type.as_str()
    } else {
        "-"
    };
    println!(
        "{:>5} Hz  {:<4} {:>6.1} dB  {:<8} wave {:.2}  |{}|",
        sample.frequency_hz,
        sample.note,
        sample.peak_db,
        voice,
        renderer.waveform_peak(),
        renderer.spectrum_line()
    );
}

fn print_summary(summary: &ProfileSummary) {
    println!("Voice type: {}", summary.voice_type);
    println!("Avg pitch:  {} Hz", summary.avg_freq);
    println!("Peak level: {:.1} dB", summary.max_db);
}

fn is_yes(answer: Option<&str>) -> bool {
    matches!(
        answer.map(|a| a.trim().to_ascii_lowercase()).as_deref(),
        Some("y" | "yes")
    )
}

/// Prints `question` and waits for the next input line.
fn ask(question: &str, lines: &Receiver<String>) -> Option<String> {
    print!("{question} ");
    let _ = std::io::stdout().flush();
    lines.recv().ok()
}

/// Runs a live session until stopped, then offers to save it.
fn listen(
    config: &Config,
    smoothing: Option<f32>,
    options: ListenOptions,
    store: &mut Store,
) -> Result<()> {
    let mut settings = config.analysis.analyser_settings();
    if let Some(smoothing) = smoothing {
        settings.smoothing = smoothing;
    }

    let source = MicrophoneSource::new(settings);
    let mut controller = SessionController::with_interval(source, config.analysis.stats_interval());
    let mut renderer = TerminalRenderer::default();

    controller
        .start()
        .context("Microphone access is required")?;
    print_status(controller.state());
    println!("Commands: p pause/resume, g start, r reset, s or q stop");

    let (line_tx, lines) = crossbeam_channel::unbounded::<String>();
    spawn_input_reader(line_tx);
    let mut commands = lines.clone();
    let ticker = crossbeam_channel::tick(FRAME_INTERVAL);
    let started = Instant::now();

    loop {
        let event = crossbeam_channel::select! {
            recv(commands) -> msg => match msg {
                Ok(line) => LoopEvent::Command(line),
                Err(_) => LoopEvent::InputClosed,
            },
            recv(ticker) -> _ => LoopEvent::Frame,
        };

        match event {
            LoopEvent::Frame => {
                if let Some(sample) = controller.tick(&mut renderer, started.elapsed()) {
                    print_readout(&sample, &renderer);
                }
                if options.duration.is_some_and(|limit| started.elapsed() >= limit) {
                    finish(&mut controller);
                    break;
                }
            }
            LoopEvent::InputClosed => {
                if ends_session_on_eof(options.duration) {
                    log::info!("stdin closed; stopping the session");
                    finish(&mut controller);
                    break;
                }
                log::debug!("stdin closed; only the timer can end the session");
                commands = crossbeam_channel::never();
            }
            LoopEvent::Command(line) => {
                let result = match SessionCommand::parse(&line) {
                    SessionCommand::TogglePause => controller.toggle_pause(),
                    SessionCommand::Start => controller.start(),
                    SessionCommand::Reset => {
                        controller.reset();
                        println!("SYSTEM RESET");
                        Ok(())
                    }
                    SessionCommand::Stop => {
                        finish(&mut controller);
                        break;
                    }
                    SessionCommand::Nothing => Ok(()),
                    SessionCommand::Unknown(other) => {
                        println!("Unknown command '{other}'");
                        Ok(())
                    }
                };
                match result {
                    Ok(()) => print_status(controller.state()),
                    Err(e) => println!("{e}"),
                }
            }
        }
    }
    print_status(controller.state());

    if !options.offer_save || !controller.can_save() {
        return Ok(());
    }

    print_summary(&controller.preview());

    let name = match options.name {
        Some(name) => name,
        None => ask("Subject name:", &lines).unwrap_or_default(),
    };
    let now = chrono::Local::now();
    let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let created_at = now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string();

    let saved = controller
        .save_profile(store, &name, now_ms, created_at, |_| {
            options.auto_confirm || is_yes(ask("Save this profile? [y/N]", &lines).as_deref())
        })
        .context("saving profile")?;

    match saved {
        Some(profile) => println!("Saved profile '{}' ({})", profile.name, profile.id),
        None => println!("Profile not saved."),
    }
    Ok(())
}

fn list_profiles(store: &Store) -> Result<()> {
    let profiles = store.load().context("reading saved profiles")?;
    if profiles.is_empty() {
        println!("No saved analyses.");
        return Ok(());
    }

    for p in &profiles {
        println!("{:<14} {:<20} {}", p.id, p.name, p.voice_type);
        println!("               \"{}\"", p.display_description());
        let avg_db = if p.has_loudness() {
            format!("{:.1}", p.avg_db)
        } else {
            "-".to_string()
        };
        println!(
            "               AVG PITCH {} Hz   AVG VOL {} dB   PEAK {:.1} dB",
            p.avg_freq, avg_db, p.max_db
        );
        println!("               {}", p.created_at);
    }
    Ok(())
}

fn delete_profile(store: &mut Store, id: u64, yes: bool) -> Result<()> {
    let removed = store.delete(id, |profile| {
        if yes {
            return true;
        }
        print!("Delete profile '{}'? [y/N] ", profile.name);
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer).is_ok() && is_yes(Some(answer.as_str()))
    });

    match removed {
        Ok(Some(profile)) => println!("Deleted '{}'", profile.name),
        Ok(None) => println!("Nothing deleted."),
        Err(VoiceError::UnknownProfile(id)) => println!("No saved profile with id {id}"),
        Err(e) => return Err(e).context("deleting profile"),
    }
    Ok(())
}

fn compare_profiles(store: &Store, ids: &[u64]) -> Result<()> {
    let profiles = store.load().context("reading saved profiles")?;

    let mut selection = Selection::default();
    for &id in ids {
        if let Err(e) = selection.select(id) {
            // Over-selection is undone; keep going with what is already selected.
            println!("{e}. Ignoring profile {id}.");
        }
    }
    for &id in selection.ids() {
        if !profiles.iter().any(|p| p.id == id) {
            println!("No saved profile with id {id}");
        }
    }
    selection.retain_existing(&profiles);

    let selected = selection.resolve(&profiles)?;
    let mut renderer = TerminalRenderer::default();
    match compare::render_comparison(&selected, &mut renderer) {
        Ok(_) => Ok(()),
        Err(VoiceError::EmptySelection) => {
            println!("Select at least 1 profile.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
