use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Where a track's frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    /// Screen, window or tab pixels
    Display,
    /// Audio played by the system or the captured surface
    SystemAudio,
    /// Microphone input
    Microphone,
}

/// Read-only view of a track's liveness, kept by whoever issued the track
#[derive(Debug, Clone)]
pub struct TrackLiveness(Arc<AtomicBool>);

impl TrackLiveness {
    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A single live audio or video track
#[derive(Debug)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    source: TrackSource,
    label: String,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, source: TrackSource, label: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            source,
            label: label.into(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn source(&self) -> TrackSource {
        self.source
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn liveness(&self) -> TrackLiveness {
        TrackLiveness(Arc::clone(&self.live))
    }

    /// Stop the track. Returns `true` if this call ended it.
    pub fn stop(&self) -> bool {
        let was_live = self.live.swap(false, Ordering::SeqCst);
        if was_live {
            debug!("Stopped {:?} track '{}' ({})", self.kind, self.label, self.id);
        }
        was_live
    }
}

/// An ordered set of tracks captured together
///
/// Dropping a stream stops every track it still holds.
#[derive(Debug)]
pub struct CaptureStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl CaptureStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn add_track(&mut self, track: MediaTrack) {
        self.tracks.push(track);
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    /// Remove and return the audio tracks, leaving the rest in place
    pub fn take_audio_tracks(&mut self) -> Vec<MediaTrack> {
        let (audio, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tracks)
            .into_iter()
            .partition(|t| t.kind == TrackKind::Audio);
        self.tracks = rest;
        audio
    }

    /// Move the audio tracks of `other` into this stream. Anything else in
    /// `other` is stopped when it drops.
    pub fn merge_audio_from(&mut self, mut other: CaptureStream) -> usize {
        let audio = other.take_audio_tracks();
        let merged = audio.len();
        self.tracks.extend(audio);
        merged
    }

    /// Stop all tracks; returns how many were still live
    pub fn stop_all_tracks(&self) -> usize {
        self.tracks.iter().filter(|t| t.stop()).count()
    }

    /// A stream is active while any of its tracks is live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        let stopped = self.stop_all_tracks();
        if stopped > 0 {
            debug!("Capture stream {} dropped with {} live tracks", self.id, stopped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display_stream() -> CaptureStream {
        CaptureStream::new(vec![
            MediaTrack::new(TrackKind::Video, TrackSource::Display, "screen"),
            MediaTrack::new(TrackKind::Audio, TrackSource::SystemAudio, "loopback"),
        ])
    }

    #[test]
    fn test_track_stop_reports_first_call_only() {
        let track = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone, "mic");
        let liveness = track.liveness();

        assert!(track.stop());
        assert!(!track.stop());
        assert!(!liveness.is_live());
    }

    #[test]
    fn test_merge_audio_keeps_only_audio() {
        let mut stream = display_stream();
        let other = CaptureStream::new(vec![
            MediaTrack::new(TrackKind::Audio, TrackSource::Microphone, "mic"),
            MediaTrack::new(TrackKind::Video, TrackSource::Display, "camera"),
        ]);
        let stray_video = other.tracks()[1].liveness();

        assert_eq!(stream.merge_audio_from(other), 1);
        assert_eq!(stream.audio_tracks().count(), 2);
        assert_eq!(stream.video_tracks().count(), 1);
        assert!(!stray_video.is_live(), "Unmerged tracks stop with their stream");
    }

    #[test]
    fn test_drop_stops_remaining_tracks() {
        let stream = display_stream();
        let views: Vec<_> = stream.tracks().iter().map(MediaTrack::liveness).collect();
        assert!(stream.is_active());

        drop(stream);
        assert!(views.iter().all(|v| !v.is_live()));
    }
}
