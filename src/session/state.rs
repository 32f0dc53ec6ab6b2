use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::format::format_elapsed;
use crate::artifact::{Artifact, ArtifactHandle, ArtifactInfo};
use crate::encoder::Chunk;

/// Recording session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Recording => "recording",
            SessionStatus::Paused => "paused",
            SessionStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// User intents the presentation layer can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Start,
    Pause,
    Resume,
    Stop,
    Download,
    Reset,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Start => "start",
            Intent::Pause => "pause",
            Intent::Resume => "resume",
            Intent::Stop => "stop",
            Intent::Download => "download",
            Intent::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// How a session reached `Stopped`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StopReason {
    /// The encoder finalised normally
    Clean,
    /// Encoding ended unexpectedly; the artifact holds what was captured
    EncoderFailure(String),
}

impl StopReason {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StopReason::EncoderFailure(_))
    }
}

/// Read-only view of the session handed to observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub elapsed_seconds: u64,
    pub mic_enabled: bool,
    pub system_audio_enabled: bool,
    pub chunk_count: usize,
    pub captured_bytes: u64,
    pub artifact: Option<ArtifactInfo>,
    pub artifact_url: Option<String>,
    pub stop_reason: Option<StopReason>,
}

impl SessionSnapshot {
    /// `MM:SS` rendering of the elapsed time
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }

    pub fn is_degraded(&self) -> bool {
        self.stop_reason
            .as_ref()
            .map(StopReason::is_degraded)
            .unwrap_or(false)
    }
}

/// The session owned by the controller
#[derive(Debug)]
pub(crate) struct RecordingSession {
    pub status: SessionStatus,
    pub elapsed_seconds: u64,
    pub mic_enabled: bool,
    pub system_audio_enabled: bool,
    pub chunks: Vec<Chunk>,
    captured_bytes: u64,
    pub artifact: Option<Arc<Artifact>>,
    pub handle: Option<ArtifactHandle>,
    pub stop_reason: Option<StopReason>,
}

impl RecordingSession {
    pub fn new(mic_enabled: bool, system_audio_enabled: bool) -> Self {
        Self {
            status: SessionStatus::Idle,
            elapsed_seconds: 0,
            mic_enabled,
            system_audio_enabled,
            chunks: Vec::new(),
            captured_bytes: 0,
            artifact: None,
            handle: None,
            stop_reason: None,
        }
    }

    /// Drop everything recorded; the audio toggles survive.
    /// The handle must already have been released.
    pub fn clear(&mut self) {
        debug_assert!(self.handle.is_none());
        self.elapsed_seconds = 0;
        self.chunks.clear();
        self.captured_bytes = 0;
        self.artifact = None;
        self.stop_reason = None;
    }

    /// Append a segment in delivery order
    pub fn push_chunk(&mut self, chunk: Chunk) {
        self.captured_bytes += chunk.len() as u64;
        self.chunks.push(chunk);
    }

    pub fn captured_bytes(&self) -> u64 {
        self.captured_bytes
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            elapsed_seconds: self.elapsed_seconds,
            mic_enabled: self.mic_enabled,
            system_audio_enabled: self.system_audio_enabled,
            chunk_count: self.chunks.len(),
            captured_bytes: self.captured_bytes(),
            artifact: self.artifact.as_ref().map(|a| a.info()),
            artifact_url: self.handle.as_ref().map(|h| h.url().to_string()),
            stop_reason: self.stop_reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_bytes_tracks_pushes_and_clear() {
        let mut session = RecordingSession::new(true, true);
        session.push_chunk(Chunk::new(vec![0u8; 10]));
        session.push_chunk(Chunk::new(vec![0u8; 32]));

        assert_eq!(session.captured_bytes(), 42);
        assert_eq!(session.snapshot().captured_bytes, 42);
        assert_eq!(session.snapshot().chunk_count, 2);

        session.clear();
        assert_eq!(session.captured_bytes(), 0);
        assert!(session.chunks.is_empty());
    }
}
