// Synthetic encoder
//
// Produces placeholder media without touching any codec. Two modes:
// - Timed: emits a fixed-size segment every interval while recording
//   (used by the CLI to run a realistic session)
// - Manual: emits only what an `EncoderProbe` tells it to (used by tests)
//
// Both modes record every control call on the shared probe.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Chunk, Encoder, EncoderEvent, EncoderFactory, EncoderSink, EncoderState};
use crate::capture::CaptureStream;
use crate::error::EncoderError;

/// EBML magic that opens every WebM/Matroska file
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticMode {
    Timed { interval: Duration, chunk_size: usize },
    Manual,
}

/// Control calls observed by the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderCall {
    Start,
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Default)]
struct ProbeInner {
    sink: Mutex<Option<EncoderSink>>,
    calls: Mutex<Vec<EncoderCall>>,
    final_chunk: Mutex<Option<Vec<u8>>>,
    fail_next_start: Mutex<Option<String>>,
    unresponsive: AtomicBool,
}

/// Test-side handle onto the most recently started synthetic encoder
#[derive(Debug, Clone, Default)]
pub struct EncoderProbe {
    inner: Arc<ProbeInner>,
}

impl EncoderProbe {
    /// Deliver a segment as if the encoder had produced it
    pub fn emit(&self, bytes: impl Into<Vec<u8>>) -> bool {
        self.send(EncoderEvent::DataAvailable(Chunk::new(bytes)))
    }

    /// Terminate encoding unexpectedly
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.send(EncoderEvent::Failed(message.into()))
    }

    /// Stop on the encoder's own initiative (e.g. the captured surface went away)
    pub fn finish(&self) -> bool {
        self.send(EncoderEvent::Stopped)
    }

    /// Segment flushed when the encoder is asked to stop
    pub fn set_final_chunk(&self, bytes: impl Into<Vec<u8>>) {
        *self.inner.final_chunk.lock() = Some(bytes.into());
    }

    pub fn fail_next_start(&self, message: impl Into<String>) {
        *self.inner.fail_next_start.lock() = Some(message.into());
    }

    /// When set, `stop()` never reports `Stopped`
    pub fn set_unresponsive(&self, unresponsive: bool) {
        self.inner.unresponsive.store(unresponsive, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<EncoderCall> {
        self.inner.calls.lock().clone()
    }

    pub fn count(&self, call: EncoderCall) -> usize {
        self.inner.calls.lock().iter().filter(|c| **c == call).count()
    }

    fn send(&self, event: EncoderEvent) -> bool {
        match self.inner.sink.lock().as_ref() {
            Some(sink) => sink.send(event),
            None => false,
        }
    }

    fn record(&self, call: EncoderCall) {
        self.inner.calls.lock().push(call);
    }
}

/// Factory handing out synthetic encoders that share one probe
#[derive(Debug, Clone)]
pub struct SyntheticEncoderFactory {
    mode: SyntheticMode,
    probe: EncoderProbe,
}

impl SyntheticEncoderFactory {
    pub fn new(mode: SyntheticMode) -> Self {
        Self {
            mode,
            probe: EncoderProbe::default(),
        }
    }

    pub fn manual() -> Self {
        Self::new(SyntheticMode::Manual)
    }

    pub fn timed(interval: Duration, chunk_size: usize) -> Self {
        Self::new(SyntheticMode::Timed {
            interval,
            chunk_size,
        })
    }

    pub fn probe(&self) -> EncoderProbe {
        self.probe.clone()
    }
}

impl EncoderFactory for SyntheticEncoderFactory {
    fn create(&self, mime_type: &str) -> Result<Box<dyn Encoder>, EncoderError> {
        Ok(Box::new(SyntheticEncoder::new(
            self.mode,
            mime_type,
            self.probe.clone(),
        )))
    }
}

pub struct SyntheticEncoder {
    mode: SyntheticMode,
    mime_type: String,
    probe: EncoderProbe,
    state_tx: watch::Sender<EncoderState>,
    sink: Option<EncoderSink>,
    task: Option<JoinHandle<()>>,
}

impl SyntheticEncoder {
    pub fn new(mode: SyntheticMode, mime_type: &str, probe: EncoderProbe) -> Self {
        let (state_tx, _) = watch::channel(EncoderState::Inactive);
        Self {
            mode,
            mime_type: mime_type.to_string(),
            probe,
            state_tx,
            sink: None,
            task: None,
        }
    }

    fn spawn_timed(&mut self, interval: Duration, chunk_size: usize, sink: EncoderSink) {
        let mut state_rx = self.state_tx.subscribe();

        self.task = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            let mut sequence: u32 = 0;

            loop {
                ticker.tick().await;
                let state = *state_rx.borrow_and_update();
                match state {
                    EncoderState::Recording => {
                        let chunk = synthetic_segment(sequence, chunk_size);
                        if !sink.send(EncoderEvent::DataAvailable(chunk)) {
                            break;
                        }
                        sequence += 1;
                    }
                    EncoderState::Paused => continue,
                    EncoderState::Inactive => break,
                }
            }

            debug!("Synthetic encoder task finished after {} segments", sequence);
        }));
    }
}

/// Placeholder segment; the first one carries the container magic
fn synthetic_segment(sequence: u32, size: usize) -> Chunk {
    let mut bytes = Vec::with_capacity(size.max(EBML_MAGIC.len()));
    if sequence == 0 {
        bytes.extend_from_slice(&EBML_MAGIC);
    }
    let fill = (sequence % 251) as u8;
    bytes.resize(size.max(bytes.len()), fill);
    Chunk::new(bytes)
}

impl Encoder for SyntheticEncoder {
    fn start(&mut self, stream: &CaptureStream, sink: EncoderSink) -> Result<(), EncoderError> {
        self.probe.record(EncoderCall::Start);

        if let Some(message) = self.probe.inner.fail_next_start.lock().take() {
            return Err(EncoderError(message));
        }
        if !stream.is_active() {
            return Err(EncoderError("capture stream has no live tracks".to_string()));
        }

        info!(
            "Synthetic encoder started ({}, {} tracks, generation {})",
            self.mime_type,
            stream.tracks().len(),
            sink.generation()
        );

        *self.probe.inner.sink.lock() = Some(sink.clone());
        self.state_tx.send_replace(EncoderState::Recording);

        if let SyntheticMode::Timed {
            interval,
            chunk_size,
        } = self.mode
        {
            self.spawn_timed(interval, chunk_size, sink.clone());
        }
        self.sink = Some(sink);

        Ok(())
    }

    fn pause(&mut self) {
        self.probe.record(EncoderCall::Pause);
        if self.state() == EncoderState::Recording {
            self.state_tx.send_replace(EncoderState::Paused);
        }
    }

    fn resume(&mut self) {
        self.probe.record(EncoderCall::Resume);
        if self.state() == EncoderState::Paused {
            self.state_tx.send_replace(EncoderState::Recording);
        }
    }

    fn stop(&mut self) {
        self.probe.record(EncoderCall::Stop);
        if self.state() == EncoderState::Inactive {
            return;
        }
        self.state_tx.send_replace(EncoderState::Inactive);

        if let Some(task) = self.task.take() {
            task.abort();
        }

        let Some(sink) = self.sink.take() else {
            return;
        };

        if self.probe.inner.unresponsive.load(Ordering::SeqCst) {
            warn!("Synthetic encoder ignoring stop request");
            return;
        }

        let flushed = match self.mode {
            SyntheticMode::Timed { chunk_size, .. } => Some(vec![0u8; chunk_size / 2]),
            SyntheticMode::Manual => self.probe.inner.final_chunk.lock().take(),
        };
        if let Some(bytes) = flushed {
            sink.send(EncoderEvent::DataAvailable(Chunk::new(bytes)));
        }
        sink.send(EncoderEvent::Stopped);
    }

    fn state(&self) -> EncoderState {
        *self.state_tx.borrow()
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl Drop for SyntheticEncoder {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
