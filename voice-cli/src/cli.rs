use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "voiceprint", about = "Real-time voice analyser and voice profile manager")]
pub struct Cli {
    /// Config file (defaults to voiceprint.toml, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding saved profiles
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse the microphone. Type p + Enter to pause/resume, r to reset, s or q to stop.
    Listen {
        /// Subject name for the saved profile
        #[arg(short, long)]
        name: Option<String>,

        /// Stop automatically after this many seconds
        #[arg(long, value_parser = parse_seconds)]
        seconds: Option<Duration>,

        /// Save without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Do not offer to save when the session ends
        #[arg(long)]
        no_save: bool,

        /// Analyser smoothing time constant (0.0-1.0)
        #[arg(long, value_parser = parse_smoothing)]
        smoothing: Option<f32>,
    },

    /// List saved profiles, most recent first
    List,

    /// Delete a saved profile
    Delete {
        id: u64,

        /// Delete without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Inspect one saved profile or compare two
    Compare {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u64>,
    },
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let seconds: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("expected a positive number of seconds, got {raw}"));
    }
    Duration::try_from_secs_f32(seconds).map_err(|e| e.to_string())
}

fn parse_smoothing(raw: &str) -> Result<f32, String> {
    let smoothing: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=1.0).contains(&smoothing) {
        return Err(format!("smoothing must be within 0.0-1.0, got {raw}"));
    }
    Ok(smoothing)
}
