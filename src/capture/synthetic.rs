// In-process capture providers
//
// These stand in for a platform capture stack: they hand out tracks that
// carry no frames but behave like real ones (they can be stopped, and the
// provider can tell how many of the tracks it issued are still live).
// The CLI records with them and the integration tests drive them to
// simulate granted, refused and missing devices.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::provider::{DisplayCaptureProvider, MicrophoneCaptureProvider};
use super::stream::{CaptureStream, MediaTrack, TrackKind, TrackLiveness, TrackSource};
use crate::error::CaptureError;

/// How a synthetic provider answers the next acquisition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticOutcome {
    Grant,
    Deny,
    Unavailable,
}

#[derive(Debug, Default)]
struct IssuedTracks {
    tracks: Mutex<Vec<TrackLiveness>>,
    acquisitions: AtomicUsize,
}

impl IssuedTracks {
    fn record(&self, stream: &CaptureStream) {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let mut tracks = self.tracks.lock();
        tracks.extend(stream.tracks().iter().map(MediaTrack::liveness));
    }

    fn live(&self) -> usize {
        self.tracks.lock().iter().filter(|t| t.is_live()).count()
    }

    fn issued(&self) -> usize {
        self.tracks.lock().len()
    }
}

fn refuse(outcome: SyntheticOutcome, what: &str) -> Option<CaptureError> {
    match outcome {
        SyntheticOutcome::Grant => None,
        SyntheticOutcome::Deny => Some(CaptureError::PermissionDenied(format!(
            "{} access was refused",
            what
        ))),
        SyntheticOutcome::Unavailable => Some(CaptureError::Unavailable(format!(
            "no {} device available",
            what
        ))),
    }
}

/// Synthetic screen capture
#[derive(Debug)]
pub struct SyntheticDisplay {
    outcome: Mutex<SyntheticOutcome>,
    supports_system_audio: bool,
    issued: IssuedTracks,
}

impl SyntheticDisplay {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(SyntheticOutcome::Grant),
            supports_system_audio: true,
            issued: IssuedTracks::default(),
        }
    }

    pub fn with_outcome(outcome: SyntheticOutcome) -> Self {
        let display = Self::new();
        display.set_outcome(outcome);
        display
    }

    /// Platforms without loopback capture silently omit the audio track
    pub fn without_system_audio(mut self) -> Self {
        self.supports_system_audio = false;
        self
    }

    pub fn set_outcome(&self, outcome: SyntheticOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Number of issued tracks that have not been stopped
    pub fn live_tracks(&self) -> usize {
        self.issued.live()
    }

    pub fn issued_tracks(&self) -> usize {
        self.issued.issued()
    }

    pub fn acquisitions(&self) -> usize {
        self.issued.acquisitions.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisplayCaptureProvider for SyntheticDisplay {
    async fn acquire_display_capture(
        &self,
        include_system_audio: bool,
    ) -> Result<CaptureStream, CaptureError> {
        if let Some(err) = refuse(*self.outcome.lock(), "screen capture") {
            return Err(err);
        }

        let mut tracks = vec![MediaTrack::new(
            TrackKind::Video,
            TrackSource::Display,
            "synthetic screen",
        )];
        if include_system_audio && self.supports_system_audio {
            tracks.push(MediaTrack::new(
                TrackKind::Audio,
                TrackSource::SystemAudio,
                "synthetic system audio",
            ));
        }

        let stream = CaptureStream::new(tracks);
        self.issued.record(&stream);
        info!(
            "Synthetic display capture granted ({} tracks)",
            stream.tracks().len()
        );
        Ok(stream)
    }

    fn name(&self) -> &str {
        "synthetic-display"
    }
}

/// Synthetic microphone
#[derive(Debug)]
pub struct SyntheticMicrophone {
    outcome: Mutex<SyntheticOutcome>,
    issued: IssuedTracks,
}

impl SyntheticMicrophone {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(SyntheticOutcome::Grant),
            issued: IssuedTracks::default(),
        }
    }

    pub fn with_outcome(outcome: SyntheticOutcome) -> Self {
        let mic = Self::new();
        mic.set_outcome(outcome);
        mic
    }

    pub fn set_outcome(&self, outcome: SyntheticOutcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn live_tracks(&self) -> usize {
        self.issued.live()
    }

    pub fn issued_tracks(&self) -> usize {
        self.issued.issued()
    }

    pub fn acquisitions(&self) -> usize {
        self.issued.acquisitions.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MicrophoneCaptureProvider for SyntheticMicrophone {
    async fn acquire_microphone_capture(&self) -> Result<CaptureStream, CaptureError> {
        if let Some(err) = refuse(*self.outcome.lock(), "microphone") {
            return Err(err);
        }

        let stream = CaptureStream::new(vec![MediaTrack::new(
            TrackKind::Audio,
            TrackSource::Microphone,
            "synthetic microphone",
        )]);
        self.issued.record(&stream);
        info!("Synthetic microphone capture granted");
        Ok(stream)
    }

    fn name(&self) -> &str {
        "synthetic-microphone"
    }
}
