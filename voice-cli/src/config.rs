use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use voice_core::fft::AnalyserSettings;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f32,
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f32,
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing: default_smoothing(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

impl AnalysisConfig {
    pub fn analyser_settings(&self) -> AnalyserSettings {
        AnalyserSettings {
            smoothing: self.smoothing,
            min_decibels: self.min_decibels,
            max_decibels: self.max_decibels,
            ..AnalyserSettings::default()
        }
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

impl StorageConfig {
    /// Configured directory, else the platform data directory, else the working directory.
    pub fn resolve_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("voiceprint")))
            .unwrap_or_else(|| PathBuf::from(".voiceprint"))
    }
}

fn default_smoothing() -> f32 { 0.8 }
fn default_min_decibels() -> f32 { -100.0 }
fn default_max_decibels() -> f32 { -30.0 }
fn default_stats_interval_ms() -> u64 { 100 }

/// Explicit path first, then `voiceprint.toml`, then `<config dir>/voiceprint/config.toml`.
pub fn locate_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("voiceprint.toml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|d| d.join("voiceprint").join("config.toml"))
        .filter(|p| p.exists())
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.smoothing, 0.8);
        assert_eq!(config.analysis.stats_interval(), Duration::from_millis(100));
        assert!(config.storage.dir.is_none());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config: Config = toml::from_str(
            "[analysis]\nsmoothing = 0.5\n\n[storage]\ndir = \"/tmp/profiles\"\n",
        )
        .unwrap();
        let settings = config.analysis.analyser_settings();
        assert_eq!(settings.smoothing, 0.5);
        assert_eq!(settings.min_decibels, -100.0);
        assert_eq!(settings.fft_size, 2048);
        assert_eq!(config.storage.resolve_dir(), PathBuf::from("/tmp/profiles"));
    }
}
