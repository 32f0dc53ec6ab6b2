use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::events::{ControlMessage, SessionEvent};
use super::sampler::Sampler;
use super::state::{Intent, RecordingSession, SessionSnapshot, SessionStatus, StopReason};
use super::timer::{Clock, ElapsedTimer, SystemClock};
use crate::artifact::{Artifact, ArtifactStore, DownloadRequest};
use crate::capture::{CaptureStream, DisplayCaptureProvider, MicrophoneCaptureProvider};
use crate::encoder::{Encoder, EncoderEvent, EncoderFactory, EncoderSink, EncoderState};
use crate::error::{SessionError, SessionResult};

/// External capabilities the controller drives
#[derive(Clone)]
pub struct Backends {
    pub display: Arc<dyn DisplayCaptureProvider>,
    pub microphone: Arc<dyn MicrophoneCaptureProvider>,
    pub encoder: Arc<dyn EncoderFactory>,
}

/// Resources held only while Recording or Paused
struct ActiveCapture {
    stream: CaptureStream,
    encoder: Box<dyn Encoder>,
}

/// Owns a recording session and mediates between the capture providers,
/// the encoder and the presentation layer
///
/// All state changes happen on the caller's task through `&mut self`.
/// The encoder and the elapsed-time sampler never touch the session
/// directly: they queue messages that are handled by `pump()`,
/// `process_next()`, `run_for()` or while `stop()` waits for finalisation.
pub struct RecordingSessionController {
    config: SessionConfig,
    backends: Backends,
    store: Arc<ArtifactStore>,
    clock: Arc<dyn Clock>,

    session: RecordingSession,
    timer: ElapsedTimer,
    active: Option<ActiveCapture>,
    sampler: Option<Sampler>,

    /// Bumped on every start attempt; tags encoder events
    generation: u64,
    /// Bumped on every sampler spawn; tags ticks
    sampler_epoch: u64,

    inbox_tx: mpsc::UnboundedSender<ControlMessage>,
    inbox_rx: mpsc::UnboundedReceiver<ControlMessage>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    event_tx: broadcast::Sender<SessionEvent>,

    disposed: bool,
}

impl RecordingSessionController {
    pub fn new(config: SessionConfig, backends: Backends) -> Self {
        let session = RecordingSession::new(config.mic_enabled, config.system_audio_enabled);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(session.snapshot());
        let (event_tx, _) = broadcast::channel(100);

        info!(
            "Recording controller ready (mic={}, system_audio={}, {})",
            config.mic_enabled, config.system_audio_enabled, config.mime_type
        );

        Self {
            config,
            backends,
            store: Arc::new(ArtifactStore::new()),
            clock: Arc::new(SystemClock),
            session,
            timer: ElapsedTimer::new(),
            active: None,
            sampler: None,
            generation: 0,
            sampler_epoch: 0,
            inbox_tx,
            inbox_rx,
            snapshot_tx,
            event_tx,
            disposed: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_artifact_store(mut self, store: Arc<ArtifactStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn artifact_store(&self) -> Arc<ArtifactStore> {
        Arc::clone(&self.store)
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Observe session snapshots; the receiver sees the latest state
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to discrete session events
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether a sampler is currently scheduled
    pub fn is_sampling(&self) -> bool {
        self.sampler.is_some()
    }

    /// Whether the controller currently owns a capture stream
    pub fn holds_capture(&self) -> bool {
        self.active.is_some()
    }

    /// Whether leaving now would lose an unfinished recording; hosts ask
    /// this before closing to confirm with the user
    pub fn has_active_recording(&self) -> bool {
        !self.disposed
            && matches!(
                self.session.status,
                SessionStatus::Recording | SessionStatus::Paused
            )
    }

    /// The merged capture stream, for a live preview while Recording or Paused
    pub fn preview_stream(&self) -> Option<&CaptureStream> {
        self.active.as_ref().map(|active| &active.stream)
    }

    pub fn set_mic_enabled(&mut self, enabled: bool) -> SessionResult<()> {
        self.ensure_settings_unlocked()?;
        self.session.mic_enabled = enabled;
        debug!("Microphone audio {}", if enabled { "enabled" } else { "disabled" });
        self.publish();
        Ok(())
    }

    pub fn set_system_audio_enabled(&mut self, enabled: bool) -> SessionResult<()> {
        self.ensure_settings_unlocked()?;
        self.session.system_audio_enabled = enabled;
        debug!("System audio {}", if enabled { "enabled" } else { "disabled" });
        self.publish();
        Ok(())
    }

    /// Idle -> Recording
    ///
    /// On failure the session stays Idle and every track acquired so far
    /// has been stopped.
    pub async fn start(&mut self) -> SessionResult<()> {
        self.ensure_live()?;
        if self.session.status != SessionStatus::Idle {
            return Err(self.invalid(Intent::Start));
        }

        let include_system_audio = self.session.system_audio_enabled;
        let with_mic = self.session.mic_enabled;
        info!(
            "Starting recording (mic={}, system_audio={})",
            with_mic, include_system_audio
        );

        let provider = Arc::clone(&self.backends.display);
        let mut stream = match provider.acquire_display_capture(include_system_audio).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Display capture via {} failed: {}", provider.name(), e);
                return Err(self.surface(e.into()));
            }
        };

        if with_mic {
            let microphone = Arc::clone(&self.backends.microphone);
            match microphone.acquire_microphone_capture().await {
                Ok(mic_stream) => {
                    let merged = stream.merge_audio_from(mic_stream);
                    debug!("Merged {} microphone track(s) into display stream", merged);
                }
                Err(e) => {
                    error!("Microphone capture via {} failed: {}", microphone.name(), e);
                    let released = stream.stop_all_tracks();
                    debug!("Released {} display track(s) after microphone failure", released);
                    return Err(self.surface(e.into()));
                }
            }
        }

        // Consume the generation even if the encoder fails to start so that
        // nothing it emitted can be attributed to a later recording
        self.generation += 1;
        let generation = self.generation;

        let mut encoder = match self.backends.encoder.create(&self.config.mime_type) {
            Ok(encoder) => encoder,
            Err(e) => {
                stream.stop_all_tracks();
                return Err(self.surface(e.into()));
            }
        };
        let sink = EncoderSink::new(generation, self.inbox_tx.clone());
        if let Err(e) = encoder.start(&stream, sink) {
            error!("Encoder failed to start: {}", e);
            stream.stop_all_tracks();
            return Err(self.surface(e.into()));
        }

        self.session.clear();
        self.timer.start(self.clock.now());
        self.active = Some(ActiveCapture { stream, encoder });
        self.session.status = SessionStatus::Recording;
        self.start_sampler();

        info!("Recording started (generation {})", generation);
        self.emit(SessionEvent::Started { generation });
        self.publish();
        Ok(())
    }

    /// Recording -> Paused; a no-op when already paused
    pub fn pause(&mut self) -> SessionResult<()> {
        self.ensure_live()?;
        match self.session.status {
            SessionStatus::Recording => {}
            SessionStatus::Paused => {
                debug!("Pause ignored: already paused");
                return Ok(());
            }
            _ => return Err(self.invalid(Intent::Pause)),
        }

        self.cancel_sampler();
        let elapsed = self.freeze_elapsed();
        if let Some(active) = self.active.as_mut() {
            active.encoder.pause();
        }
        self.session.status = SessionStatus::Paused;

        info!("Recording paused at {}s", elapsed);
        self.emit(SessionEvent::Paused {
            elapsed_seconds: elapsed,
        });
        self.publish();
        Ok(())
    }

    /// Paused -> Recording; a no-op in any other state
    pub fn resume(&mut self) -> SessionResult<()> {
        self.ensure_live()?;
        if self.session.status != SessionStatus::Paused {
            debug!("Resume ignored while {}", self.session.status);
            return Ok(());
        }

        if let Some(active) = self.active.as_mut() {
            active.encoder.resume();
        }
        self.timer.resume(self.clock.now());
        self.session.status = SessionStatus::Recording;
        self.start_sampler();

        let elapsed = self.session.elapsed_seconds;
        info!("Recording resumed at {}s", elapsed);
        self.emit(SessionEvent::Resumed {
            elapsed_seconds: elapsed,
        });
        self.publish();
        Ok(())
    }

    /// Recording/Paused -> Stopped
    ///
    /// Requests finalisation and processes queued messages until the encoder
    /// reports it has stopped. If it does not within `stop_timeout`, the
    /// session is stopped anyway with the chunks received so far.
    pub async fn stop(&mut self) -> SessionResult<SessionSnapshot> {
        self.ensure_live()?;
        if !matches!(
            self.session.status,
            SessionStatus::Recording | SessionStatus::Paused
        ) {
            return Err(self.invalid(Intent::Stop));
        }

        info!("Stopping recording");
        self.cancel_sampler();
        self.freeze_elapsed();
        if let Some(active) = self.active.as_mut() {
            active.encoder.stop();
        }

        let deadline = tokio::time::Instant::now() + self.config.stop_timeout;
        while self.session.status != SessionStatus::Stopped {
            match tokio::time::timeout_at(deadline, self.inbox_rx.recv()).await {
                Ok(Some(message)) => self.handle(message),
                Ok(None) => {
                    self.finalize_unresponsive("encoder channel closed before finalising");
                }
                Err(_) => {
                    let reason = format!(
                        "encoder did not finalise within {}ms",
                        self.config.stop_timeout.as_millis()
                    );
                    self.finalize_unresponsive(&reason);
                }
            }
        }

        Ok(self.snapshot())
    }

    /// Describe the artifact for download
    pub fn download(&self) -> SessionResult<DownloadRequest> {
        self.ensure_live()?;
        if self.session.status != SessionStatus::Stopped {
            return Err(self.invalid(Intent::Download));
        }

        match (&self.session.artifact, &self.session.handle) {
            (Some(artifact), Some(handle)) => {
                let request = DownloadRequest::new(
                    &self.config.file_prefix,
                    handle.url(),
                    Arc::clone(artifact),
                    Utc::now(),
                );
                info!("Download prepared: {}", request.file_name);
                Ok(request)
            }
            _ => Err(SessionError::NoArtifact),
        }
    }

    /// Stopped -> Idle; a no-op when already idle
    pub fn reset(&mut self) -> SessionResult<()> {
        self.ensure_live()?;
        match self.session.status {
            SessionStatus::Stopped => {}
            SessionStatus::Idle => return Ok(()),
            _ => return Err(self.invalid(Intent::Reset)),
        }

        self.release_handle();
        self.session.clear();
        self.timer.reset();
        self.session.status = SessionStatus::Idle;

        info!("Session reset");
        self.emit(SessionEvent::Reset);
        self.publish();
        Ok(())
    }

    /// Sample elapsed time (what each sampler tick does)
    pub fn tick(&mut self) -> u64 {
        if self.disposed || self.session.status != SessionStatus::Recording {
            return self.session.elapsed_seconds;
        }

        let sampled = self.timer.sample(self.clock.now());
        if sampled > self.session.elapsed_seconds {
            self.session.elapsed_seconds = sampled;
            self.emit(SessionEvent::Tick {
                elapsed_seconds: sampled,
            });
            self.publish();
        }
        self.session.elapsed_seconds
    }

    /// Handle every queued message without waiting; returns how many
    pub fn pump(&mut self) -> usize {
        if self.disposed {
            return 0;
        }

        let mut handled = 0;
        while let Ok(message) = self.inbox_rx.try_recv() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Wait for and handle one message
    pub async fn process_next(&mut self) -> bool {
        if self.disposed {
            return false;
        }

        match self.inbox_rx.recv().await {
            Some(message) => {
                self.handle(message);
                true
            }
            None => false,
        }
    }

    /// Handle messages as they arrive for `duration`
    pub async fn run_for(&mut self, duration: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + duration;
        let mut handled = 0;

        while !self.disposed {
            match tokio::time::timeout_at(deadline, self.inbox_rx.recv()).await {
                Ok(Some(message)) => {
                    self.handle(message);
                    handled += 1;
                }
                Ok(None) | Err(_) => break,
            }
        }
        handled
    }

    /// Release every resource the session holds. Runs once; later calls
    /// and every intent after it are rejected or ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        info!("Disposing recording controller while {}", self.session.status);
        self.cancel_sampler();

        if let Some(mut active) = self.active.take() {
            if active.encoder.state() != EncoderState::Inactive {
                active.encoder.stop();
            }
            let released = active.stream.stop_all_tracks();
            debug!("Released {} capture track(s) on dispose", released);
        }

        self.release_handle();
        self.inbox_rx.close();
        self.emit(SessionEvent::Disposed);
    }

    fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::Tick { epoch } => {
                let current = self.sampler.as_ref().map(Sampler::epoch);
                if current == Some(epoch) {
                    self.tick();
                } else {
                    debug!("Dropping stale tick from sampler {}", epoch);
                }
            }
            ControlMessage::Encoder { generation, event } => {
                // Paused too: encoders flush buffered data at pause and stop
                let accepting = matches!(
                    self.session.status,
                    SessionStatus::Recording | SessionStatus::Paused
                );
                if generation != self.generation || !accepting {
                    debug!(
                        "Dropping encoder event from generation {} while {}",
                        generation, self.session.status
                    );
                    return;
                }
                self.handle_encoder_event(event);
            }
        }
    }

    fn handle_encoder_event(&mut self, event: EncoderEvent) {
        match event {
            EncoderEvent::DataAvailable(chunk) => {
                if chunk.is_empty() {
                    return;
                }
                let index = self.session.chunks.len();
                let size = chunk.len();
                self.session.push_chunk(chunk);
                debug!("Captured chunk {} ({} bytes)", index, size);
                self.emit(SessionEvent::ChunkCaptured { index, size });
                self.publish();
            }
            EncoderEvent::Stopped => self.finalize(StopReason::Clean),
            EncoderEvent::Failed(message) => {
                error!("Encoder failed mid-recording: {}", message);
                self.surface(SessionError::EncodingFailure(message.clone()));
                self.finalize(StopReason::EncoderFailure(message));
            }
        }
    }

    fn finalize_unresponsive(&mut self, reason: &str) {
        warn!("Finalising without encoder: {}", reason);
        self.surface(SessionError::EncodingFailure(reason.to_string()));
        self.finalize(StopReason::EncoderFailure(reason.to_string()));
    }

    /// Enter Stopped: release capture, assemble the artifact, mint its handle
    fn finalize(&mut self, reason: StopReason) {
        self.cancel_sampler();
        let elapsed = self.freeze_elapsed();

        let mut mime_type = self.config.mime_type.clone();
        if let Some(mut active) = self.active.take() {
            if active.encoder.state() != EncoderState::Inactive {
                active.encoder.stop();
            }
            mime_type = active.encoder.mime_type().to_string();
            let released = active.stream.stop_all_tracks();
            debug!("Released {} capture track(s)", released);
        }

        if !self.session.chunks.is_empty() {
            let artifact = Arc::new(Artifact::assemble(&self.session.chunks, &mime_type));
            self.session.handle = Some(self.store.register(Arc::clone(&artifact)));
            self.session.artifact = Some(artifact);
        }

        let artifact_bytes = self.session.artifact.as_ref().map(|a| a.size_bytes());
        self.session.status = SessionStatus::Stopped;
        self.session.stop_reason = Some(reason.clone());

        match &reason {
            StopReason::Clean => info!(
                "Recording stopped: {}s, {} chunks, {} bytes",
                elapsed,
                self.session.chunks.len(),
                artifact_bytes.unwrap_or(0)
            ),
            StopReason::EncoderFailure(message) => warn!(
                "Recording stopped after encoder failure ({}): kept {} chunks",
                message,
                self.session.chunks.len()
            ),
        }

        self.emit(SessionEvent::Stopped {
            elapsed_seconds: elapsed,
            reason,
            artifact_bytes,
        });
        self.publish();
    }

    fn start_sampler(&mut self) {
        self.sampler_epoch += 1;
        self.sampler = Some(Sampler::spawn(
            self.sampler_epoch,
            self.config.tick_interval,
            self.inbox_tx.clone(),
        ));
    }

    fn cancel_sampler(&mut self) {
        // Dropping aborts the task
        self.sampler.take();
    }

    fn freeze_elapsed(&mut self) -> u64 {
        let frozen = self.timer.pause(self.clock.now());
        self.session.elapsed_seconds = self.session.elapsed_seconds.max(frozen);
        self.session.elapsed_seconds
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.session.handle.take() {
            if let Err(e) = self.store.revoke(handle) {
                warn!("Failed to revoke artifact handle: {}", e);
            }
        }
    }

    fn ensure_live(&self) -> SessionResult<()> {
        if self.disposed {
            Err(SessionError::Disposed)
        } else {
            Ok(())
        }
    }

    fn ensure_settings_unlocked(&self) -> SessionResult<()> {
        self.ensure_live()?;
        if self.session.status != SessionStatus::Idle {
            return Err(SessionError::SettingsLocked(self.session.status));
        }
        Ok(())
    }

    fn invalid(&self, intent: Intent) -> SessionError {
        warn!("Rejected {} while {}", intent, self.session.status);
        SessionError::InvalidTransition {
            intent,
            status: self.session.status,
        }
    }

    /// Broadcast a user-facing error once and hand it back
    fn surface(&self, error: SessionError) -> SessionError {
        self.emit(SessionEvent::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        });
        error
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.session.snapshot());
    }
}

impl Drop for RecordingSessionController {
    fn drop(&mut self) {
        self.dispose();
    }
}
