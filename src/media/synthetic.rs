//! Deterministic media platform
//!
//! Provides a fake camera and a microphone that produces a sine tone as raw
//! 16-bit PCM. Used by the headless binary and by tests, which tune its knobs
//! to reproduce platform failures (permission denied, no recorder, recorder
//! that never flushes, ...).

use super::constraints::MediaConstraints;
use super::platform::{MediaDevices, MediaRecorder, RecorderEvent, RecorderState};
use super::stream::{MediaStream, MediaTrack, TrackKind, TrackSettings};
use crate::error::PlatformError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Whether the recorder sends its final chunk and `Stopped` after stop()
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushBehavior {
    Normal,
    Never,
}

/// Knobs for the synthetic platform
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Whether device capture exists at all
    pub api_available: bool,
    /// Error returned from every media request
    pub failure: Option<PlatformError>,
    /// Whether the microphone exists
    pub with_audio: bool,
    /// Whether a streaming recorder exists
    pub recorder_available: bool,
    /// Mime types accepted besides the raw PCM default
    pub supported_mime_types: Vec<String>,
    pub flush: FlushBehavior,
    /// Microphone sample rate (the platform ignores the requested rate)
    pub sample_rate: u32,
    pub tone_hz: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            api_available: true,
            failure: None,
            with_audio: true,
            recorder_available: true,
            supported_mime_types: Vec::new(),
            flush: FlushBehavior::Normal,
            sample_rate: 16000,
            tone_hz: 440.0,
        }
    }
}

impl SyntheticConfig {
    /// Mime type of the platform's default recorder output
    pub fn default_mime_type(&self) -> String {
        format!("audio/L16;rate={};channels=1", self.sample_rate)
    }
}

/// Synthetic camera + microphone
#[derive(Debug, Default)]
pub struct SyntheticDevices {
    config: SyntheticConfig,
    issued: Mutex<Vec<MediaTrack>>,
    recorders_created: AtomicUsize,
}

impl SyntheticDevices {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            issued: Mutex::new(Vec::new()),
            recorders_created: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Number of issued tracks that are still live
    pub fn live_tracks(&self) -> usize {
        crate::sync::lock(&self.issued)
            .iter()
            .filter(|t| t.is_live())
            .count()
    }

    /// Camera/microphone indicator
    pub fn indicator_on(&self) -> bool {
        self.live_tracks() > 0
    }

    pub fn recorders_created(&self) -> usize {
        self.recorders_created.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaDevices for SyntheticDevices {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_available(&self) -> bool {
        self.config.api_available
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, PlatformError> {
        if let Some(failure) = &self.config.failure {
            return Err(failure.clone());
        }

        let video = &constraints.video;
        let mut tracks = vec![MediaTrack::new(
            TrackKind::Video,
            "Synthetic Camera",
            TrackSettings::Video {
                width: video.ideal_width.min(video.max_width),
                height: video.ideal_height.min(video.max_height),
                facing_mode: video.facing_mode,
            },
        )];

        if self.config.with_audio {
            tracks.push(MediaTrack::new(
                TrackKind::Audio,
                "Synthetic Microphone",
                TrackSettings::Audio {
                    sample_rate: self.config.sample_rate,
                    channels: 1,
                    echo_cancellation: constraints.audio.echo_cancellation,
                    noise_suppression: constraints.audio.noise_suppression,
                },
            ));
        }

        crate::sync::lock(&self.issued).extend(tracks.iter().cloned());

        Ok(MediaStream::new(tracks))
    }

    fn recorder_available(&self) -> bool {
        self.config.recorder_available
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        mime_type == self.config.default_mime_type()
            || self
                .config
                .supported_mime_types
                .iter()
                .any(|m| m == mime_type)
    }

    fn create_recorder(
        &self,
        stream: &MediaStream,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn MediaRecorder>, PlatformError> {
        if !self.config.recorder_available {
            return Err(PlatformError::new(
                "NotSupportedError",
                "MediaRecorder API not supported",
            ));
        }

        let track = stream
            .audio_tracks()
            .next()
            .cloned()
            .ok_or_else(|| PlatformError::new("NotFoundError", "no audio track to record"))?;

        let mime_type = match mime_type {
            Some(m) if self.is_type_supported(m) => m.to_string(),
            Some(m) => {
                return Err(PlatformError::new(
                    "NotSupportedError",
                    format!("unsupported mime type: {}", m),
                ))
            }
            None => self.config.default_mime_type(),
        };

        self.recorders_created.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(SyntheticRecorder {
            mime_type,
            track,
            sample_rate: self.config.sample_rate,
            tone_hz: self.config.tone_hz,
            flush: self.config.flush,
            state: RecorderState::Inactive,
            stop_tx: None,
        }))
    }
}

struct SyntheticRecorder {
    mime_type: String,
    track: MediaTrack,
    sample_rate: u32,
    tone_hz: f32,
    flush: FlushBehavior,
    state: RecorderState,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl MediaRecorder for SyntheticRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn state(&self) -> RecorderState {
        self.state
    }

    fn start(
        &mut self,
        timeslice: Duration,
    ) -> Result<mpsc::UnboundedReceiver<RecorderEvent>, PlatformError> {
        if self.state == RecorderState::Recording {
            return Err(PlatformError::new("InvalidStateError", "recorder already started"));
        }
        if !self.track.is_live() {
            return Err(PlatformError::new("InvalidStateError", "audio track has ended"));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        let generator = ToneGenerator::new(self.sample_rate, self.tone_hz);
        tokio::spawn(run_recorder(
            events_tx,
            stop_rx,
            timeslice,
            self.track.clone(),
            generator,
            self.flush,
        ));

        self.stop_tx = Some(stop_tx);
        self.state = RecorderState::Recording;

        info!(
            "Synthetic recorder started ({}, {}ms slices)",
            self.mime_type,
            timeslice.as_millis()
        );

        Ok(events_rx)
    }

    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.state = RecorderState::Inactive;
    }
}

impl Drop for SyntheticRecorder {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_recorder(
    events: mpsc::UnboundedSender<RecorderEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    timeslice: Duration,
    track: MediaTrack,
    mut generator: ToneGenerator,
    flush: FlushBehavior,
) {
    let mut ticker = tokio::time::interval(timeslice);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut slice_started = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // The recorder ends by itself once its track is stopped
                if !track.is_live() {
                    break;
                }

                let chunk = generator.next_chunk(timeslice);
                slice_started = Instant::now();
                if events.send(RecorderEvent::Data(chunk)).is_err() {
                    return;
                }
            }
            _ = &mut stop_rx => break,
        }
    }

    if flush == FlushBehavior::Never {
        debug!("Synthetic recorder stopped without flushing");
        // Keep the channel open like a platform that simply goes silent
        events.closed().await;
        return;
    }

    let remainder = generator.next_chunk(slice_started.elapsed());
    if !remainder.is_empty() {
        let _ = events.send(RecorderEvent::Data(remainder));
    }
    let _ = events.send(RecorderEvent::Stopped);
}

/// Sine tone as big-endian i16 PCM (network order, as `audio/L16` declares)
struct ToneGenerator {
    sample_rate: u32,
    tone_hz: f32,
    position: u64,
}

impl ToneGenerator {
    fn new(sample_rate: u32, tone_hz: f32) -> Self {
        Self {
            sample_rate,
            tone_hz,
            position: 0,
        }
    }

    fn next_chunk(&mut self, duration: Duration) -> Vec<u8> {
        let count = (duration.as_secs_f64() * self.sample_rate as f64).round() as usize;
        let amplitude = i16::MAX as f32 * 0.2;

        let mut bytes = Vec::with_capacity(count * 2);
        for _ in 0..count {
            let t = self.position as f32 / self.sample_rate as f32;
            let sample = (amplitude * (2.0 * std::f32::consts::PI * self.tone_hz * t).sin()) as i16;
            bytes.extend_from_slice(&sample.to_be_bytes());
            self.position += 1;
        }

        bytes
    }
}
