pub mod provider;
pub mod stream;
pub mod synthetic;

pub use provider::{DisplayCaptureProvider, MicrophoneCaptureProvider};
pub use stream::{CaptureStream, MediaTrack, TrackKind, TrackLiveness, TrackSource};
pub use synthetic::{SyntheticDisplay, SyntheticMicrophone, SyntheticOutcome};
