use async_trait::async_trait;

use super::stream::CaptureStream;
use crate::error::CaptureError;

/// Screen capture source
///
/// Implementations may prompt the user; the call resolves once the prompt
/// is answered.
#[async_trait]
pub trait DisplayCaptureProvider: Send + Sync {
    /// Acquire a stream with one video track and, when requested and
    /// supported, a system audio track
    async fn acquire_display_capture(
        &self,
        include_system_audio: bool,
    ) -> Result<CaptureStream, CaptureError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Microphone capture source
#[async_trait]
pub trait MicrophoneCaptureProvider: Send + Sync {
    /// Acquire a stream holding the microphone's audio track(s)
    async fn acquire_microphone_capture(&self) -> Result<CaptureStream, CaptureError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
