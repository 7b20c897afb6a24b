use super::constraints::MediaConstraints;
use super::stream::MediaStream;
use crate::error::PlatformError;
use std::time::Duration;
use tokio::sync::mpsc;

/// Event emitted by a platform recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// An encoded chunk (one per timeslice, plus a final one on stop)
    Data(Vec<u8>),
    /// Non-fatal recorder error
    Error(String),
    /// The recorder has flushed everything and stopped
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
}

/// Streaming audio encoder provided by the platform
pub trait MediaRecorder: Send {
    /// Mime type the recorder actually produces
    fn mime_type(&self) -> &str;

    fn state(&self) -> RecorderState;

    /// Start recording, emitting a chunk every `timeslice`
    ///
    /// Returns a channel receiver that will receive recorder events
    fn start(
        &mut self,
        timeslice: Duration,
    ) -> Result<mpsc::UnboundedReceiver<RecorderEvent>, PlatformError>;

    /// Request a stop. The final chunk and `Stopped` arrive asynchronously,
    /// and some platforms never send them.
    fn stop(&mut self);
}

/// Camera/microphone platform
///
/// Implementations:
/// - `SyntheticDevices`: deterministic camera and tone microphone
/// - Browser/native capture stacks plug in behind the same trait
#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    /// Platform name for logging
    fn name(&self) -> &str;

    /// Whether the platform offers device capture at all
    fn is_available(&self) -> bool;

    /// Request camera and microphone access
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, PlatformError>;

    /// Whether a streaming recorder exists on this platform
    fn recorder_available(&self) -> bool;

    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Create a recorder over the audio tracks of `stream`.
    /// `None` means the platform default format.
    fn create_recorder(
        &self,
        stream: &MediaStream,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn MediaRecorder>, PlatformError>;
}
