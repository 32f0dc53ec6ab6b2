use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::session::SessionConfig;

/// Application configuration
///
/// Sources, later ones winning: built-in defaults, the config file, then
/// `SCREEN_RECORDER__<SECTION>__<KEY>` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recorder: RecorderConfig,
    pub output: OutputConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub mic_enabled: bool,
    pub system_audio_enabled: bool,
    pub tick_interval_ms: u64,
    pub stop_timeout_ms: u64,
    pub mime_type: String,
    pub file_prefix: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            mic_enabled: session.mic_enabled,
            system_audio_enabled: session.system_audio_enabled,
            tick_interval_ms: session.tick_interval.as_millis() as u64,
            stop_timeout_ms: session.stop_timeout.as_millis() as u64,
            mime_type: session.mime_type,
            file_prefix: session.file_prefix,
        }
    }
}

impl RecorderConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            mic_enabled: self.mic_enabled,
            system_audio_enabled: self.system_audio_enabled,
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
            mime_type: self.mime_type.clone(),
            file_prefix: self.file_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where downloads are saved; `~` is expanded
    pub download_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: ".".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn download_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.download_dir).into_owned())
    }
}

/// Parameters of the synthetic CLI recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub duration_secs: u64,
    pub chunk_interval_ms: u64,
    pub chunk_size_bytes: usize,
    pub pause_after_secs: Option<u64>,
    pub pause_for_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            duration_secs: 5,
            chunk_interval_ms: 250,
            chunk_size_bytes: 16 * 1024,
            pause_after_secs: None,
            pause_for_secs: 2,
        }
    }
}

impl DemoConfig {
    /// Seconds of recording after which to pause, if the pause fits
    /// inside the run
    pub fn pause_point(&self) -> Option<u64> {
        match self.pause_after_secs {
            Some(after) if after < self.duration_secs => Some(after),
            Some(after) => {
                warn!(
                    "Ignoring pause after {}s: recording only lasts {}s",
                    after, self.duration_secs
                );
                None
            }
            None => None,
        }
    }
}

/// Values given on the command line; `None`/`false` keeps the loaded value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub duration_secs: Option<u64>,
    pub no_mic: bool,
    pub no_system_audio: bool,
    pub download_dir: Option<String>,
    pub pause_after_secs: Option<u64>,
    pub pause_for_secs: Option<u64>,
}

impl Config {
    /// Load from `path` (extension optional, file may be absent) and the
    /// environment
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SCREEN_RECORDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Layer command-line values on top of the loaded configuration
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(duration) = overrides.duration_secs {
            self.demo.duration_secs = duration;
        }
        if overrides.no_mic {
            self.recorder.mic_enabled = false;
        }
        if overrides.no_system_audio {
            self.recorder.system_audio_enabled = false;
        }
        if let Some(dir) = &overrides.download_dir {
            self.output.download_dir = dir.clone();
        }
        if overrides.pause_after_secs.is_some() {
            self.demo.pause_after_secs = overrides.pause_after_secs;
        }
        if let Some(pause_for) = overrides.pause_for_secs {
            self.demo.pause_for_secs = pause_for;
        }
    }
}
