// Integration tests for the recording session state machine
//
// These tests walk the controller through start, pause, resume, stop,
// download and reset, checking the snapshot after each transition.

mod common;

use anyhow::Result;
use common::Harness;
use screen_recorder::encoder::EncoderCall;
use screen_recorder::{Intent, SessionError, SessionStatus, StopReason};

#[tokio::test]
async fn test_full_session_excludes_pause_window() -> Result<()> {
    let mut h = Harness::new();
    assert!(h.controller.snapshot().mic_enabled);
    assert!(h.controller.snapshot().system_audio_enabled);

    h.controller.start().await?;
    assert_eq!(h.controller.status(), SessionStatus::Recording);

    h.probe.emit(vec![1u8; 400]);
    h.advance_ticks(3);
    assert_eq!(h.controller.snapshot().elapsed_seconds, 3);

    h.controller.pause()?;
    h.advance_ticks(2);
    assert_eq!(h.controller.snapshot().elapsed_seconds, 3, "Paused time must not count");

    h.controller.resume()?;
    h.probe.emit(vec![2u8; 100]);
    h.advance_ticks(2);

    let snapshot = h.controller.stop().await?;

    assert_eq!(snapshot.status, SessionStatus::Stopped);
    assert_eq!(snapshot.elapsed_seconds, 5);
    assert_eq!(snapshot.chunk_count, 2);
    assert_eq!(snapshot.stop_reason, Some(StopReason::Clean));
    assert!(!snapshot.is_degraded());

    let artifact = snapshot.artifact.expect("artifact should exist after stop");
    assert_eq!(artifact.size_bytes, 500);
    assert_eq!(artifact.mime_type, "video/webm");
    assert!(snapshot.artifact_url.is_some());

    Ok(())
}

#[tokio::test]
async fn test_start_merges_microphone_and_system_audio() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;

    // Screen video + system audio + microphone
    assert_eq!(h.display.issued_tracks(), 2);
    assert_eq!(h.mic.issued_tracks(), 1);
    assert_eq!(h.live_tracks(), 3);
    assert!(h.controller.holds_capture());
    assert!(h.controller.is_sampling());

    h.controller.stop().await?;
    assert_eq!(h.live_tracks(), 0, "Stop must release every capture track");
    assert!(!h.controller.holds_capture());
    assert!(!h.controller.is_sampling());

    Ok(())
}

#[tokio::test]
async fn test_audio_toggles_control_acquisition() -> Result<()> {
    let mut h = Harness::new();
    h.controller.set_mic_enabled(false)?;
    h.controller.set_system_audio_enabled(false)?;

    h.controller.start().await?;

    assert_eq!(h.mic.acquisitions(), 0, "Microphone should not be requested");
    assert_eq!(h.display.issued_tracks(), 1, "Only the video track expected");

    h.controller.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_settings_locked_outside_idle() -> Result<()> {
    let mut h = Harness::new();
    h.controller.start().await?;

    let err = h.controller.set_mic_enabled(false).unwrap_err();
    assert!(matches!(err, SessionError::SettingsLocked(SessionStatus::Recording)));
    assert!(h.controller.snapshot().mic_enabled);

    h.controller.stop().await?;
    assert!(h.controller.set_system_audio_enabled(false).is_err());

    h.controller.reset()?;
    h.controller.set_system_audio_enabled(false)?;
    assert!(!h.controller.snapshot().system_audio_enabled);

    Ok(())
}

#[tokio::test]
async fn test_stop_from_idle_is_rejected() -> Result<()> {
    let mut h = Harness::new();

    let err = h.controller.stop().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            intent: Intent::Stop,
            status: SessionStatus::Idle
        }
    ));
    assert_eq!(h.controller.status(), SessionStatus::Idle);
    assert!(h.probe.calls().is_empty(), "No encoder should have been touched");

    Ok(())
}

#[tokio::test]
async fn test_pause_and_resume_are_idempotent() -> Result<()> {
    let mut h = Harness::new();

    // Resume outside Paused does nothing
    h.controller.resume()?;
    assert_eq!(h.controller.status(), SessionStatus::Idle);

    // Pause from Idle is not a valid transition
    assert!(matches!(
        h.controller.pause(),
        Err(SessionError::InvalidTransition {
            intent: Intent::Pause,
            ..
        })
    ));

    h.controller.start().await?;
    h.controller.pause()?;
    h.controller.pause()?;
    assert_eq!(h.probe.count(EncoderCall::Pause), 1);
    assert!(!h.controller.is_sampling());

    h.controller.resume()?;
    h.controller.resume()?;
    assert_eq!(h.probe.count(EncoderCall::Resume), 1);
    assert_eq!(h.controller.status(), SessionStatus::Recording);

    h.controller.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_stop_from_paused_keeps_frozen_time() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.probe.emit(vec![9u8; 10]);
    h.advance_ticks(4);
    h.controller.pause()?;
    h.clock.advance_secs(30);

    let snapshot = h.controller.stop().await?;
    assert_eq!(snapshot.elapsed_seconds, 4);
    assert_eq!(snapshot.status, SessionStatus::Stopped);

    Ok(())
}

#[tokio::test]
async fn test_final_flush_is_part_of_artifact() -> Result<()> {
    let mut h = Harness::new();
    h.probe.set_final_chunk(vec![7u8; 64]);

    h.controller.start().await?;
    h.probe.emit(vec![1u8; 32]);
    h.advance_ticks(1);

    let snapshot = h.controller.stop().await?;
    assert_eq!(snapshot.chunk_count, 2);
    assert_eq!(snapshot.captured_bytes, 96);

    let download = h.controller.download()?;
    let bytes = download.artifact.bytes();
    assert_eq!(&bytes[..32], &[1u8; 32][..], "Chunks keep delivery order");
    assert_eq!(&bytes[32..], &[7u8; 64][..]);

    Ok(())
}

#[tokio::test]
async fn test_empty_segments_are_discarded() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.probe.emit(Vec::new());
    h.probe.emit(vec![3u8; 8]);
    h.probe.emit(Vec::new());
    assert_eq!(h.controller.pump(), 3);

    assert_eq!(h.controller.snapshot().chunk_count, 1);
    h.controller.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_stop_without_chunks_has_no_artifact() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.advance_ticks(1);
    let snapshot = h.controller.stop().await?;

    assert_eq!(snapshot.status, SessionStatus::Stopped);
    assert!(snapshot.artifact.is_none());
    assert!(snapshot.artifact_url.is_none());
    assert!(matches!(h.controller.download(), Err(SessionError::NoArtifact)));
    assert_eq!(h.store.created_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_reset_returns_to_empty_idle() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.probe.emit(vec![5u8; 256]);
    h.advance_ticks(2);
    h.controller.stop().await?;
    assert_eq!(h.store.outstanding(), 1);

    h.controller.reset()?;

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert_eq!(snapshot.chunk_count, 0);
    assert!(snapshot.artifact.is_none());
    assert!(snapshot.artifact_url.is_none());
    assert!(snapshot.stop_reason.is_none());
    assert_eq!(h.store.outstanding(), 0);
    assert_eq!(h.store.revoked_count(), 1);

    // Reset from Idle is a no-op
    h.controller.reset()?;
    assert_eq!(h.store.revoked_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_reset_while_recording_is_rejected() -> Result<()> {
    let mut h = Harness::new();
    h.controller.start().await?;

    assert!(matches!(
        h.controller.reset(),
        Err(SessionError::InvalidTransition {
            intent: Intent::Reset,
            status: SessionStatus::Recording
        })
    ));

    h.controller.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_second_recording_starts_fresh() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.probe.emit(vec![1u8; 10]);
    h.advance_ticks(3);
    h.controller.stop().await?;
    h.controller.reset()?;

    h.controller.start().await?;
    assert_eq!(h.controller.snapshot().elapsed_seconds, 0);
    h.probe.emit(vec![2u8; 20]);
    h.advance_ticks(1);
    let snapshot = h.controller.stop().await?;

    assert_eq!(snapshot.elapsed_seconds, 1);
    assert_eq!(snapshot.captured_bytes, 20);
    assert_eq!(h.store.created_count(), 2);
    assert_eq!(h.store.outstanding(), 1);

    Ok(())
}

#[tokio::test]
async fn test_start_while_recording_is_rejected() -> Result<()> {
    let mut h = Harness::new();
    h.controller.start().await?;

    assert!(matches!(
        h.controller.start().await,
        Err(SessionError::InvalidTransition {
            intent: Intent::Start,
            ..
        })
    ));
    assert_eq!(h.display.acquisitions(), 1);

    h.controller.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_encoder_stopping_on_its_own_finalises_cleanly() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.probe.emit(vec![4u8; 16]);
    h.advance_ticks(2);
    h.probe.finish();
    h.controller.pump();

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Stopped);
    assert_eq!(snapshot.stop_reason, Some(StopReason::Clean));
    assert_eq!(snapshot.elapsed_seconds, 2);
    assert_eq!(h.live_tracks(), 0);
    assert!(snapshot.artifact.is_some());

    Ok(())
}

#[tokio::test]
async fn test_encoder_receives_control_calls_in_order() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.controller.pause()?;
    h.controller.resume()?;
    h.controller.stop().await?;

    assert_eq!(
        h.probe.calls(),
        vec![
            EncoderCall::Start,
            EncoderCall::Pause,
            EncoderCall::Resume,
            EncoderCall::Stop
        ]
    );

    // The encoder is gone once stopped
    assert!(!h.controller.holds_capture());

    Ok(())
}

#[tokio::test]
async fn test_preview_stream_follows_capture() -> Result<()> {
    let mut h = Harness::new();
    assert!(h.controller.preview_stream().is_none());

    h.controller.start().await?;
    let preview = h.controller.preview_stream().expect("preview while recording");
    assert_eq!(preview.tracks().len(), 3);
    assert_eq!(preview.video_tracks().count(), 1);
    assert_eq!(preview.audio_tracks().count(), 2);
    assert!(preview.is_active());

    h.controller.pause()?;
    assert!(h.controller.preview_stream().is_some(), "Preview stays while paused");

    h.controller.stop().await?;
    assert!(h.controller.preview_stream().is_none());

    Ok(())
}

#[tokio::test]
async fn test_active_recording_guards_leaving() -> Result<()> {
    let mut h = Harness::new();
    assert!(!h.controller.has_active_recording());

    h.controller.start().await?;
    assert!(h.controller.has_active_recording());

    h.controller.pause()?;
    assert!(h.controller.has_active_recording());

    h.controller.stop().await?;
    assert!(!h.controller.has_active_recording(), "Nothing left to lose once stopped");

    h.controller.reset()?;
    h.controller.start().await?;
    h.controller.dispose();
    assert!(!h.controller.has_active_recording());
    assert!(h.controller.preview_stream().is_none());

    Ok(())
}

#[tokio::test]
async fn test_segment_flushed_at_pause_is_kept() -> Result<()> {
    let mut h = Harness::new();

    h.controller.start().await?;
    h.controller.pause()?;
    h.probe.emit(vec![6u8; 24]);
    h.controller.pump();
    assert_eq!(h.controller.snapshot().chunk_count, 1);

    let snapshot = h.controller.stop().await?;
    assert_eq!(snapshot.captured_bytes, 24);

    Ok(())
}
