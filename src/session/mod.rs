//! Recording session management
//!
//! This module provides the `RecordingSessionController` that manages:
//! - Screen, system audio and microphone capture acquisition and release
//! - Encoder control and chunk accumulation
//! - Elapsed-time accounting across pause/resume
//! - The output artifact and its transient handle
//! - Change notifications for the presentation layer

mod config;
mod controller;
mod events;
mod format;
mod sampler;
mod state;
mod timer;

pub use config::SessionConfig;
pub use controller::{Backends, RecordingSessionController};
pub use events::SessionEvent;
pub use format::{format_elapsed, format_size_mb};
pub use state::{Intent, SessionSnapshot, SessionStatus, StopReason};
pub use timer::{Clock, ElapsedTimer, ManualClock, SystemClock};

pub(crate) use events::ControlMessage;
