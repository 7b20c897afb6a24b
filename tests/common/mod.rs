#![allow(dead_code)]

use chrono::Utc;
use engagement_monitor::engagement::{synthesize_sample, SampleSource};
use engagement_monitor::error::{PlatformError, RemoteError};
use engagement_monitor::media::{
    FacingMode, MediaConstraints, MediaDevices, MediaRecorder, MediaStream, MediaTrack,
    RecorderEvent, RecorderState, TrackKind, TrackSettings,
};
use engagement_monitor::recorder::AudioArtifact;
use engagement_monitor::remote::{RemoteEngagementService, RemoteSession, SessionReport};
use engagement_monitor::EngagementSample;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Engagement backend double that records every call
#[derive(Default)]
pub struct FakeRemote {
    pub fail_create: AtomicBool,
    pub fail_samples: AtomicBool,
    pub create_delay: Mutex<Duration>,
    pub sample_delay: Mutex<Duration>,
    pub stop_delay: Mutex<Duration>,
    pub stop_error: Mutex<Option<RemoteError>>,
    pub create_calls: AtomicUsize,
    pub sample_calls: AtomicUsize,
    pub submissions: Mutex<Vec<(String, AudioArtifact)>>,
}

impl FakeRemote {
    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn samples(&self) -> usize {
        self.sample_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(String, AudioArtifact)> {
        self.submissions.lock().unwrap().clone()
    }
}

async fn pause(delay: &Mutex<Duration>) {
    let delay = *delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait::async_trait]
impl RemoteEngagementService for FakeRemote {
    fn name(&self) -> &str {
        "fake"
    }

    async fn health(&self) -> bool {
        true
    }

    async fn create_session(&self, lecture_name: &str) -> Result<RemoteSession, RemoteError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        pause(&self.create_delay).await;

        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }

        Ok(RemoteSession {
            session_id: format!("session-{}", n),
            lecture_name: lecture_name.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn current_sample(&self, _session_id: &str) -> Result<EngagementSample, RemoteError> {
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        pause(&self.sample_delay).await;

        if self.fail_samples.load(Ordering::SeqCst) {
            return Err(RemoteError::Timeout);
        }

        Ok(synthesize_sample(&mut rand::thread_rng(), SampleSource::Remote))
    }

    async fn stop_session(
        &self,
        session_id: &str,
        artifact: &AudioArtifact,
    ) -> Result<SessionReport, RemoteError> {
        self.submissions
            .lock()
            .unwrap()
            .push((session_id.to_string(), artifact.clone()));
        pause(&self.stop_delay).await;

        if let Some(error) = self.stop_error.lock().unwrap().clone() {
            return Err(error);
        }

        Ok(SessionReport {
            session_id: Some(session_id.to_string()),
            ..Default::default()
        })
    }
}

/// Platform whose recorder replays a fixed list of chunks
pub struct ScriptedDevices {
    pub chunks: Vec<Vec<u8>>,
    /// Whether the recorder sends `Stopped` when asked to stop
    pub flushes: bool,
    pub supported: Vec<&'static str>,
}

impl ScriptedDevices {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            flushes: true,
            supported: vec!["audio/webm"],
        }
    }
}

#[async_trait::async_trait]
impl MediaDevices for ScriptedDevices {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn get_user_media(
        &self,
        _constraints: &MediaConstraints,
    ) -> Result<MediaStream, PlatformError> {
        Ok(MediaStream::new(vec![
            MediaTrack::new(
                TrackKind::Video,
                "Scripted Camera",
                TrackSettings::Video {
                    width: 640,
                    height: 480,
                    facing_mode: FacingMode::User,
                },
            ),
            MediaTrack::new(
                TrackKind::Audio,
                "Scripted Microphone",
                TrackSettings::Audio {
                    sample_rate: 48000,
                    channels: 1,
                    echo_cancellation: true,
                    noise_suppression: true,
                },
            ),
        ]))
    }

    fn recorder_available(&self) -> bool {
        true
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|m| *m == mime_type)
    }

    fn create_recorder(
        &self,
        _stream: &MediaStream,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn MediaRecorder>, PlatformError> {
        Ok(Box::new(ScriptedRecorder {
            mime_type: mime_type.unwrap_or("audio/ogg").to_string(),
            chunks: self.chunks.clone(),
            flushes: self.flushes,
            events: None,
        }))
    }
}

struct ScriptedRecorder {
    mime_type: String,
    chunks: Vec<Vec<u8>>,
    flushes: bool,
    events: Option<mpsc::UnboundedSender<RecorderEvent>>,
}

impl MediaRecorder for ScriptedRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn state(&self) -> RecorderState {
        if self.events.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Inactive
        }
    }

    fn start(
        &mut self,
        _timeslice: Duration,
    ) -> Result<mpsc::UnboundedReceiver<RecorderEvent>, PlatformError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for (i, chunk) in self.chunks.iter().enumerate() {
            tx.send(RecorderEvent::Data(chunk.clone())).ok();
            if i == 0 {
                tx.send(RecorderEvent::Error("transient glitch".to_string()))
                    .ok();
            }
        }
        self.events = Some(tx);
        Ok(rx)
    }

    fn stop(&mut self) {
        if self.flushes {
            if let Some(tx) = self.events.take() {
                tx.send(RecorderEvent::Stopped).ok();
            }
        }
        // A recorder that never flushes keeps its channel open
    }
}

/// Wraps another platform and holds every media request for `delay`
pub struct SlowDevices<D> {
    pub inner: std::sync::Arc<D>,
    pub delay: Duration,
}

#[async_trait::async_trait]
impl<D: MediaDevices> MediaDevices for SlowDevices<D> {
    fn name(&self) -> &str {
        "slow"
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, PlatformError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_user_media(constraints).await
    }

    fn recorder_available(&self) -> bool {
        self.inner.recorder_available()
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.inner.is_type_supported(mime_type)
    }

    fn create_recorder(
        &self,
        stream: &MediaStream,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn MediaRecorder>, PlatformError> {
        self.inner.create_recorder(stream, mime_type)
    }
}
