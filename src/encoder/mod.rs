//! Encoder/muxer abstraction
//!
//! An encoder consumes a merged capture stream and delivers encoded media
//! back to the controller as a sequence of events:
//! - `DataAvailable` for each segment produced while recording
//! - `Stopped` once finalisation completes after `stop()`
//! - `Failed` if encoding terminates unexpectedly

pub mod synthetic;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::capture::CaptureStream;
use crate::error::EncoderError;
use crate::session::ControlMessage;

pub use synthetic::{EncoderCall, EncoderProbe, SyntheticEncoder, SyntheticEncoderFactory, SyntheticMode};

/// One encoded media segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(Vec<u8>);

impl Chunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Event delivered by an encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    DataAvailable(Chunk),
    Stopped,
    Failed(String),
}

/// Encoder lifecycle as seen by the encoder itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderState {
    Inactive,
    Recording,
    Paused,
}

/// Where an encoder delivers its events
///
/// Events are tagged with the recording generation the encoder was started
/// for, so anything an old encoder sends after its session has moved on is
/// discarded by the controller.
#[derive(Debug, Clone)]
pub struct EncoderSink {
    generation: u64,
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl EncoderSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<ControlMessage>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event. Returns `false` once the controller is gone.
    pub fn send(&self, event: EncoderEvent) -> bool {
        self.tx
            .send(ControlMessage::Encoder {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// Encoder/muxer contract
///
/// Control calls are requests: `stop()` returns immediately and the encoder
/// later delivers any buffered data followed by `EncoderEvent::Stopped`.
pub trait Encoder: Send {
    /// Begin encoding `stream`, delivering events to `sink`
    fn start(&mut self, stream: &CaptureStream, sink: EncoderSink) -> Result<(), EncoderError>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    fn state(&self) -> EncoderState;

    /// Container/codec of the produced media
    fn mime_type(&self) -> &str;
}

/// Creates one encoder per recording
pub trait EncoderFactory: Send + Sync {
    fn create(&self, mime_type: &str) -> Result<Box<dyn Encoder>, EncoderError>;
}
