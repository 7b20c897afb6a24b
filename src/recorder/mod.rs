//! Audio recording over the microphone track
//!
//! `AudioRecorder` drives a platform `MediaRecorder`, appends its chunks to a
//! `RecordingBuffer` in arrival order, and on stop turns them into a single
//! `AudioArtifact`.

mod buffer;
mod mime;

pub use buffer::{AudioArtifact, RecordingBuffer, UploadPayload};
pub use mime::{negotiate_mime_type, FALLBACK_MIME_TYPE, PREFERRED_MIME_TYPE};

use crate::error::RecorderError;
use crate::media::{MediaDevices, MediaRecorder, MediaStream, RecorderEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Recorder timing
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// How often the platform emits a chunk
    pub timeslice: Duration,
    /// How long stop() waits for the final flush before assembling anyway
    pub flush_grace: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            timeslice: Duration::from_secs(1),
            flush_grace: Duration::from_secs(1),
        }
    }
}

/// Streaming recorder over an audio stream
pub struct AudioRecorder {
    recorder: Box<dyn MediaRecorder>,
    buffer: Arc<Mutex<RecordingBuffer>>,
    collector: Option<JoinHandle<()>>,
    mime_type: String,
    flush_grace: Duration,
}

impl AudioRecorder {
    /// Negotiate a format and start recording `audio`
    pub fn start(
        devices: &dyn MediaDevices,
        audio: &MediaStream,
        config: &RecorderConfig,
    ) -> Result<Self, RecorderError> {
        if !devices.recorder_available() {
            return Err(RecorderError::Unsupported);
        }
        if !audio.has_audio() {
            return Err(RecorderError::NoAudioTrack);
        }

        let requested = negotiate_mime_type(|m| devices.is_type_supported(m));

        let mut recorder = devices
            .create_recorder(audio, requested)
            .map_err(|e| RecorderError::Create(e.to_string()))?;

        let events = recorder
            .start(config.timeslice)
            .map_err(|e| RecorderError::Start(e.to_string()))?;

        let mime_type = recorder.mime_type().to_string();
        let buffer = Arc::new(Mutex::new(RecordingBuffer::new()));
        let collector = tokio::spawn(collect_chunks(events, Arc::clone(&buffer)));

        info!(
            "Audio recorder started: {} (requested {})",
            mime_type,
            requested.unwrap_or("platform default")
        );

        Ok(Self {
            recorder,
            buffer,
            collector: Some(collector),
            mime_type,
            flush_grace: config.flush_grace,
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Chunks buffered so far
    pub fn chunk_count(&self) -> usize {
        crate::sync::lock(&self.buffer).len()
    }

    /// Stop recording and assemble the artifact.
    ///
    /// Waits at most the flush grace period for the platform's final chunk;
    /// after that whatever was buffered is used. Returns `None` when no
    /// chunk was ever captured.
    pub async fn stop(mut self) -> Option<AudioArtifact> {
        self.recorder.stop();

        if let Some(mut collector) = self.collector.take() {
            match tokio::time::timeout(self.flush_grace, &mut collector).await {
                Ok(Ok(())) => debug!("Recorder flushed"),
                Ok(Err(e)) => warn!("Chunk collector failed: {}", e),
                Err(_) => {
                    warn!(
                        "Recorder did not flush within {:?}, assembling {} buffered chunks",
                        self.flush_grace,
                        crate::sync::lock(&self.buffer).len()
                    );
                    collector.abort();
                }
            }
        }

        let artifact = crate::sync::lock(&self.buffer).take_artifact(&self.mime_type);

        match &artifact {
            Some(a) => info!(
                "Audio artifact ready: {} bytes in {} chunks ({})",
                a.len(),
                a.chunk_count(),
                a.mime_type()
            ),
            None => info!("Recorder captured no audio"),
        }

        artifact
    }

    /// Stop without waiting for a flush, discarding buffered chunks
    pub fn abort(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(collector) = self.collector.take() {
            self.recorder.stop();
            collector.abort();
        }
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn collect_chunks(
    mut events: mpsc::UnboundedReceiver<RecorderEvent>,
    buffer: Arc<Mutex<RecordingBuffer>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            RecorderEvent::Data(chunk) => {
                crate::sync::lock(&buffer).push(chunk);
            }
            RecorderEvent::Error(message) => {
                warn!("Recorder error: {}", message);
            }
            RecorderEvent::Stopped => break,
        }
    }
}
