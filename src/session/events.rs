use serde::Serialize;

use super::state::StopReason;
use crate::encoder::EncoderEvent;

/// Discrete notifications broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { generation: u64 },
    Paused { elapsed_seconds: u64 },
    Resumed { elapsed_seconds: u64 },
    Tick { elapsed_seconds: u64 },
    ChunkCaptured { index: usize, size: usize },
    Stopped {
        elapsed_seconds: u64,
        reason: StopReason,
        artifact_bytes: Option<u64>,
    },
    Reset,
    Error { code: String, message: String },
    Disposed,
}

/// Messages queued for the controller's control thread
#[derive(Debug)]
pub(crate) enum ControlMessage {
    /// Elapsed-time sample request from the sampler with this epoch
    Tick { epoch: u64 },
    /// Event from the encoder started for this recording generation
    Encoder { generation: u64, event: EncoderEvent },
}
