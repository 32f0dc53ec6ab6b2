//! Error types for the recording controller and its collaborators

use thiserror::Error;

use crate::session::{Intent, SessionStatus};

/// Failure reported by a display or microphone capture provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The user or the platform refused access
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The device or platform lacks the requested capability
    #[error("capture unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by an encoder when it cannot start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("encoder error: {0}")]
pub struct EncoderError(pub String);

/// Artifact store and download failures
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("unknown artifact handle: {0}")]
    UnknownHandle(String),

    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by `RecordingSessionController`
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("capture permission denied: {0}")]
    CapturePermissionDenied(String),

    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("encoding failure: {0}")]
    EncodingFailure(String),

    #[error("cannot {intent} while {status}")]
    InvalidTransition {
        intent: Intent,
        status: SessionStatus,
    },

    #[error("audio settings can only change while idle (currently {0})")]
    SettingsLocked(SessionStatus),

    #[error("no recording available")]
    NoArtifact,

    #[error("controller has been disposed")]
    Disposed,

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl SessionError {
    /// Stable machine-readable code for presentation layers
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::CapturePermissionDenied(_) => "CAPTURE_PERMISSION_DENIED",
            SessionError::CaptureUnavailable(_) => "CAPTURE_UNAVAILABLE",
            SessionError::EncodingFailure(_) => "ENCODING_FAILURE",
            SessionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SessionError::SettingsLocked(_) => "SETTINGS_LOCKED",
            SessionError::NoArtifact => "NO_ARTIFACT",
            SessionError::Disposed => "DISPOSED",
            SessionError::Artifact(_) => "ARTIFACT_ERROR",
        }
    }
}

impl From<CaptureError> for SessionError {
    fn from(error: CaptureError) -> Self {
        match error {
            CaptureError::PermissionDenied(msg) => SessionError::CapturePermissionDenied(msg),
            CaptureError::Unavailable(msg) => SessionError::CaptureUnavailable(msg),
        }
    }
}

impl From<EncoderError> for SessionError {
    fn from(error: EncoderError) -> Self {
        SessionError::EncodingFailure(error.0)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
