use super::constraints::MediaConstraints;
use super::platform::MediaDevices;
use super::stream::MediaStream;
use crate::error::{DeviceError, DeviceErrorKind};
use std::sync::Arc;
use tracing::{info, warn};

/// Separated video and audio streams from one device request.
///
/// Owns the device tracks: releasing (or dropping) the session stops every
/// track and turns the hardware indicator off.
#[derive(Debug)]
pub struct MediaSession {
    video: MediaStream,
    audio: MediaStream,
    released: bool,
}

impl MediaSession {
    pub fn new(video: MediaStream, audio: MediaStream) -> Self {
        Self {
            video,
            audio,
            released: false,
        }
    }

    /// Video-only stream, shown muted
    pub fn video(&self) -> &MediaStream {
        &self.video
    }

    /// Audio-only stream; may hold zero tracks
    pub fn audio(&self) -> &MediaStream {
        &self.audio
    }

    pub fn has_audio(&self) -> bool {
        self.audio.has_audio()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop all tracks. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }

        self.video.stop_all();
        self.audio.stop_all();
        self.released = true;

        info!(
            "Released media session (video={}, audio={})",
            self.video.id(),
            self.audio.id()
        );
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Requests camera + microphone access from a platform
#[derive(Clone)]
pub struct MediaAcquisition {
    devices: Arc<dyn MediaDevices>,
}

impl MediaAcquisition {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &Arc<dyn MediaDevices> {
        &self.devices
    }

    /// Acquire devices and split the combined stream.
    ///
    /// Either both stream handles are returned or exactly one
    /// `DeviceErrorKind` is reported.
    pub async fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaSession, DeviceError> {
        if !self.devices.is_available() {
            return Err(DeviceError::new(
                DeviceErrorKind::ApiUnavailable,
                format!("{}: camera API not available on this device", self.devices.name()),
            ));
        }

        info!(
            "Requesting media from {} (ideal {}x{}, facing {:?})",
            self.devices.name(),
            constraints.video.ideal_width,
            constraints.video.ideal_height,
            constraints.video.facing_mode
        );

        let stream = self
            .devices
            .get_user_media(constraints)
            .await
            .map_err(|e| {
                let error = DeviceError::from(e);
                warn!("Media request failed ({:?}): {}", error.kind, error.detail);
                error
            })?;

        let (video, audio) = stream.split();

        if !video.has_video() {
            audio.stop_all();
            return Err(DeviceError::new(
                DeviceErrorKind::DeviceNotFound,
                "platform returned no video track",
            ));
        }

        info!(
            "Media acquired: {} video track(s), {} audio track(s)",
            video.video_tracks().count(),
            audio.audio_tracks().count()
        );

        Ok(MediaSession::new(video, audio))
    }
}
