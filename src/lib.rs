pub mod artifact;
pub mod capture;
pub mod config;
pub mod encoder;
pub mod error;
pub mod session;

pub use artifact::{Artifact, ArtifactHandle, ArtifactInfo, ArtifactStore, DownloadRequest};
pub use capture::{
    CaptureStream, DisplayCaptureProvider, MediaTrack, MicrophoneCaptureProvider,
    SyntheticDisplay, SyntheticMicrophone, SyntheticOutcome, TrackKind, TrackSource,
};
pub use config::Config;
pub use encoder::{
    Chunk, Encoder, EncoderEvent, EncoderFactory, EncoderProbe, EncoderSink, EncoderState,
    SyntheticEncoderFactory,
};
pub use error::{ArtifactError, CaptureError, EncoderError, SessionError, SessionResult};
pub use session::{
    Backends, Clock, Intent, ManualClock, RecordingSessionController, SessionConfig,
    SessionEvent, SessionSnapshot, SessionStatus, StopReason,
};
