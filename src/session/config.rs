use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime options for a `RecordingSessionController`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Merge microphone audio into the recording
    pub mic_enabled: bool,

    /// Ask the display provider for system audio
    pub system_audio_enabled: bool,

    /// Period of the elapsed-time sampler
    /// Default: 1 second
    pub tick_interval: Duration,

    /// How long `stop()` waits for the encoder to finalise
    pub stop_timeout: Duration,

    /// Media type requested from the encoder
    pub mime_type: String,

    /// Prefix of suggested download file names
    pub file_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mic_enabled: true,
            system_audio_enabled: true,
            tick_interval: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(5),
            mime_type: "video/webm".to_string(),
            file_prefix: "screen-recording".to_string(),
        }
    }
}
