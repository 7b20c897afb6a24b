use super::config::SessionConfig;
use super::display::{DisplaySnapshot, DisplayState, VideoPreview};
use super::state::LifecycleState;
use super::store::SessionStore;
use crate::engagement::{EngagementSample, EngagementSampler, LatestSample};
use crate::error::{DeviceError, RemoteError};
use crate::media::{MediaAcquisition, MediaDevices, MediaSession};
use crate::recorder::{AudioArtifact, AudioRecorder};
use crate::remote::{RemoteEngagementService, SessionReport};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const SESSION_EXPIRED_MESSAGE: &str =
    "Session expired. The audio was recorded but may not be processed. Please try starting a new recording.";

/// Result of `SessionCoordinator::start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Devices acquired and recording began
    Started,
    /// A session is already underway; nothing was done
    AlreadyActive(LifecycleState),
    /// Torn down while devices were being acquired
    Cancelled,
}

/// Result of `SessionCoordinator::stop`
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// Not recording; nothing was done
    Ignored,
    /// No audio was captured, so nothing was submitted
    NothingToSubmit,
    /// Artifact submitted to the session created at start
    Submitted {
        session_id: String,
        report: SessionReport,
    },
    /// No session id was known; a fresh session was created at stop time
    Recovered {
        session_id: String,
        report: SessionReport,
    },
    /// Recovery failed and the artifact was dropped
    Discarded { reason: String },
    /// The backend rejected the submission
    Failed {
        session_id: String,
        session_not_found: bool,
        message: String,
    },
}

impl StopOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::NothingToSubmit => "nothing_to_submit",
            Self::Submitted { .. } => "submitted",
            Self::Recovered { .. } => "recovered",
            Self::Discarded { .. } => "discarded",
            Self::Failed { .. } => "failed",
        }
    }

    /// Backend session the audio went to, if any
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Submitted { session_id, .. }
            | Self::Recovered { session_id, .. }
            | Self::Failed { session_id, .. } => Some(session_id),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&SessionReport> {
        match self {
            Self::Submitted { report, .. } | Self::Recovered { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Point-in-time view of a coordinator
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub state: LifecycleState,
    pub elapsed: String,
    #[serde(flatten)]
    pub display: DisplaySnapshot,
    pub sample: Option<EngagementSample>,
    pub session_id: Option<String>,
}

/// Resources owned while a recording is live
struct ActiveRecording {
    media: MediaSession,
    recorder: Option<AudioRecorder>,
    sampler: EngagementSampler,
    elapsed_timer: JoinHandle<()>,
    create_task: Option<JoinHandle<()>>,
}

impl ActiveRecording {
    /// Stop timers and release devices. The recorder is handed back so the
    /// caller decides whether to finalize or abort it.
    fn release(mut self) -> Option<AudioRecorder> {
        self.elapsed_timer.abort();
        self.sampler.stop();
        if let Some(task) = self.create_task.take() {
            task.abort();
        }
        self.media.release();
        self.recorder.take()
    }
}

struct Inner {
    lifecycle: LifecycleState,
    /// Bumped on every start, stop and teardown; late start-time results
    /// carrying an older epoch are dropped
    epoch: u64,
    active: Option<ActiveRecording>,
}

impl Inner {
    fn transition(&mut self, next: LifecycleState) {
        if !self.lifecycle.can_transition_to(next) {
            warn!("Unexpected lifecycle transition {} -> {}", self.lifecycle, next);
        }
        debug!("Lifecycle {} -> {}", self.lifecycle, next);
        self.lifecycle = next;
    }
}

/// State shared with background tasks
struct Shared {
    inner: Mutex<Inner>,
    display: DisplayState,
    session_id: watch::Sender<Option<String>>,
    store: Arc<dyn SessionStore>,
}

impl Shared {
    fn remember_session(&self, session_id: &str) {
        self.session_id.send_replace(Some(session_id.to_string()));
        if let Err(e) = self.store.save(session_id) {
            warn!("Failed to persist session id: {}", e);
        }
    }

    fn forget_session(&self) {
        self.session_id.send_replace(None);
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear persisted session id: {}", e);
        }
    }

    /// Session id from memory, falling back to the durable slot
    fn resolve_session(&self) -> Option<String> {
        if let Some(id) = self.session_id.borrow().clone() {
            return Some(id);
        }

        match self.store.load() {
            Ok(Some(id)) => {
                info!("Recovered session id {} from durable storage", id);
                Some(id)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read persisted session id: {}", e);
                None
            }
        }
    }
}

/// Drives one monitoring session at a time through its lifecycle.
///
/// `start()` acquires the camera and microphone, starts the recorder, the
/// elapsed timer and the engagement sampler, and creates a backend session
/// in the background. `stop()` releases devices first, then finalizes the
/// recording and submits it. Both are no-ops outside the state they apply
/// to, and `stop()` always ends in `Idle`.
pub struct SessionCoordinator {
    config: SessionConfig,
    acquisition: MediaAcquisition,
    remote: Arc<dyn RemoteEngagementService>,
    latest: LatestSample,
    shared: Arc<Shared>,
}

impl SessionCoordinator {
    pub fn new(
        config: SessionConfig,
        devices: Arc<dyn MediaDevices>,
        remote: Arc<dyn RemoteEngagementService>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let (session_id, _rx) = watch::channel(None);

        Self {
            config,
            acquisition: MediaAcquisition::new(devices),
            remote,
            latest: LatestSample::new(),
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    lifecycle: LifecycleState::Idle,
                    epoch: 0,
                    active: None,
                }),
                display: DisplayState::new(),
                session_id,
                store,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> LifecycleState {
        crate::sync::lock(&self.shared.inner).lifecycle
    }

    pub fn display(&self) -> &DisplayState {
        &self.shared.display
    }

    /// Latest engagement sample, if any tick has run
    pub fn latest_sample(&self) -> Option<EngagementSample> {
        self.latest.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<EngagementSample>> {
        self.latest.subscribe()
    }

    /// In-memory backend session id
    pub fn session_id(&self) -> Option<String> {
        self.shared.session_id.borrow().clone()
    }

    pub fn dismiss_error(&self) {
        self.shared.display.clear_error();
    }

    pub fn status(&self) -> MonitorStatus {
        let display = self.shared.display.snapshot();
        MonitorStatus {
            state: self.lifecycle(),
            elapsed: display.elapsed(),
            display,
            sample: self.latest.get(),
            session_id: self.session_id(),
        }
    }

    /// Acquire devices and begin recording.
    ///
    /// A device failure is shown on the display and returned; the
    /// coordinator is back in `Idle` afterwards.
    pub async fn start(&self) -> Result<StartOutcome, DeviceError> {
        let epoch = {
            let mut inner = crate::sync::lock(&self.shared.inner);
            if inner.lifecycle != LifecycleState::Idle {
                debug!("start() ignored in {} state", inner.lifecycle);
                return Ok(StartOutcome::AlreadyActive(inner.lifecycle));
            }
            inner.transition(LifecycleState::Starting);
            inner.epoch += 1;
            inner.epoch
        };

        info!("Starting engagement monitoring: {}", self.config.lecture_name);

        self.shared.display.update(|d| {
            d.error = None;
            d.warning = None;
            d.is_loading = true;
        });

        let acquired = self.acquisition.acquire(&self.config.constraints).await;

        let mut inner = crate::sync::lock(&self.shared.inner);

        if inner.epoch != epoch {
            // Torn down mid-acquisition; the session drops and releases here
            info!("Start cancelled during device acquisition");
            let idle = inner.lifecycle == LifecycleState::Idle;
            drop(inner);
            // A newer start may already own the loading flag
            if idle {
                self.shared.display.update(|d| d.is_loading = false);
            }
            return Ok(StartOutcome::Cancelled);
        }

        let media = match acquired {
            Ok(media) => media,
            Err(e) => {
                error!("Failed to acquire media: {}", e);
                inner.transition(LifecycleState::Idle);
                self.shared.display.update(|d| {
                    d.error = Some(e.user_message());
                    d.is_loading = false;
                });
                return Err(e);
            }
        };

        let recorder = self.start_recorder(&media);

        // A fresh recording starts with no in-memory session; the durable
        // slot is left for stop-time recovery.
        self.shared.session_id.send_replace(None);

        let mut sampler = EngagementSampler::new(
            Arc::clone(&self.remote),
            self.latest.clone(),
            self.shared.session_id.subscribe(),
            self.config.sample_interval,
        );
        sampler.start();

        let preview = VideoPreview::from_stream(media.video());

        inner.active = Some(ActiveRecording {
            elapsed_timer: self.spawn_elapsed_timer(),
            create_task: Some(self.spawn_create_session(epoch)),
            media,
            recorder,
            sampler,
        });
        inner.transition(LifecycleState::Recording);
        drop(inner);

        self.shared.display.update(|d| {
            d.is_recording = true;
            d.is_loading = false;
            d.elapsed_secs = 0;
            d.preview = Some(preview);
        });

        info!("Recording started");
        Ok(StartOutcome::Started)
    }

    fn start_recorder(&self, media: &MediaSession) -> Option<AudioRecorder> {
        if !media.has_audio() {
            warn!("No audio track available, recording video only");
            return None;
        }

        let devices = self.acquisition.devices();
        match AudioRecorder::start(devices.as_ref(), media.audio(), &self.config.recorder) {
            Ok(recorder) => Some(recorder),
            Err(e) => {
                warn!("Audio recording unavailable, continuing video only: {}", e);
                self.shared
                    .display
                    .set_warning(format!("Audio recording failed: {}", e));
                None
            }
        }
    }

    fn spawn_elapsed_timer(&self) -> JoinHandle<()> {
        let display = self.shared.display.clone();
        let period = self.config.elapsed_tick;

        tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval_at(started + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                display.set_elapsed(started.elapsed().as_secs());
            }
        })
    }

    /// Create the backend session off the critical path
    fn spawn_create_session(&self, epoch: u64) -> JoinHandle<()> {
        let remote = Arc::clone(&self.remote);
        let shared = Arc::clone(&self.shared);
        let lecture_name = self.config.lecture_name.clone();

        tokio::spawn(async move {
            let result = remote.create_session(&lecture_name).await;

            let inner = crate::sync::lock(&shared.inner);
            if inner.epoch != epoch || inner.lifecycle != LifecycleState::Recording {
                debug!("Dropping session-create result from a finished recording");
                return;
            }

            match result {
                Ok(session) => {
                    info!("Backend session ready: {}", session.session_id);
                    shared.remember_session(&session.session_id);
                    shared.display.clear_error();
                }
                Err(e) => {
                    warn!("Backend session not created, will retry at stop: {}", e);
                }
            }
        })
    }

    /// Stop recording, release devices and submit the audio.
    ///
    /// Always returns to `Idle`. Backend failures are reported through the
    /// returned outcome and the display, never as an error.
    pub async fn stop(&self) -> StopOutcome {
        let active = {
            let mut inner = crate::sync::lock(&self.shared.inner);
            if inner.lifecycle != LifecycleState::Recording {
                debug!("stop() ignored in {} state", inner.lifecycle);
                return StopOutcome::Ignored;
            }
            inner.transition(LifecycleState::Stopping);
            inner.epoch += 1;
            inner.active.take()
        };

        info!("Stopping engagement monitoring");

        // Devices and timers go first so the indicator turns off before any
        // network I/O.
        let recorder = active.and_then(ActiveRecording::release);

        self.shared.display.update(|d| {
            d.is_recording = false;
            d.is_loading = true;
            d.preview = None;
        });

        crate::sync::lock(&self.shared.inner).transition(LifecycleState::Finalizing);

        let artifact = match recorder {
            Some(recorder) => recorder.stop().await,
            None => None,
        };

        let outcome = match artifact {
            Some(artifact) => self.submit(artifact).await,
            None => {
                info!("No audio captured, nothing to submit");
                StopOutcome::NothingToSubmit
            }
        };

        {
            let mut inner = crate::sync::lock(&self.shared.inner);
            if inner.lifecycle != LifecycleState::Idle {
                inner.transition(LifecycleState::Idle);
            }
        }
        self.shared.display.update(|d| d.is_loading = false);

        info!("Monitoring stopped: {}", outcome.label());
        outcome
    }

    async fn submit(&self, artifact: AudioArtifact) -> StopOutcome {
        self.archive(&artifact);

        match self.shared.resolve_session() {
            Some(session_id) => self.submit_to(session_id, &artifact).await,
            None => self.recover(&artifact).await,
        }
    }

    async fn submit_to(&self, session_id: String, artifact: &AudioArtifact) -> StopOutcome {
        info!(
            "Submitting {} bytes of audio to session {}",
            artifact.len(),
            session_id
        );

        match self.remote.stop_session(&session_id, artifact).await {
            Ok(report) => {
                self.accept_report(&report);
                StopOutcome::Submitted { session_id, report }
            }
            Err(e) => self.submission_failed(session_id, e),
        }
    }

    /// No session id was ever obtained: create one now and submit to it
    async fn recover(&self, artifact: &AudioArtifact) -> StopOutcome {
        warn!("No session id known at stop, creating a new session for the recording");

        let session = match self.remote.create_session(&self.config.lecture_name).await {
            Ok(session) => session,
            Err(e) => return discard(format!("session recovery failed: {}", e)),
        };

        match self.remote.stop_session(&session.session_id, artifact).await {
            Ok(report) => {
                self.accept_report(&report);
                StopOutcome::Recovered {
                    session_id: session.session_id,
                    report,
                }
            }
            Err(e) => discard(format!("recovered session rejected audio: {}", e)),
        }
    }

    fn accept_report(&self, report: &SessionReport) {
        info!(
            "Session report received ({} timeline points)",
            report.timeline_len()
        );
        self.shared.forget_session();
        let report = report.clone();
        self.shared.display.update(|d| d.last_report = Some(report));
    }

    fn submission_failed(&self, session_id: String, e: RemoteError) -> StopOutcome {
        let session_not_found = e.is_session_not_found();

        let message = if session_not_found {
            self.shared.forget_session();
            SESSION_EXPIRED_MESSAGE.to_string()
        } else {
            format!("Failed to process audio: {}", e)
        };

        error!("Submission to session {} failed: {}", session_id, e);
        self.shared.display.set_error(message.clone());

        StopOutcome::Failed {
            session_id,
            session_not_found,
            message,
        }
    }

    fn archive(&self, artifact: &AudioArtifact) {
        let Some(dir) = &self.config.archive_dir else {
            return;
        };

        let name = format!(
            "recording-{}.{}",
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            artifact.file_extension()
        );
        let path = dir.join(name);

        let saved = std::fs::create_dir_all(dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| artifact.save(&path));

        match saved {
            Ok(()) => info!("Archived recording to {:?}", path),
            Err(e) => warn!("Failed to archive recording: {}", e),
        }
    }

    /// Synchronous best-effort cleanup: timers, tracks and recorder are
    /// released and no network call is made.
    pub fn teardown(&self) {
        let active = {
            let mut inner = crate::sync::lock(&self.shared.inner);
            inner.epoch += 1;
            if matches!(
                inner.lifecycle,
                LifecycleState::Starting | LifecycleState::Recording
            ) {
                inner.transition(LifecycleState::Idle);
            }
            inner.active.take()
        };

        if let Some(active) = active {
            info!("Tearing down active recording");
            if let Some(recorder) = active.release() {
                recorder.abort();
            }
            self.shared.display.update(|d| {
                d.is_recording = false;
                d.is_loading = false;
                d.preview = None;
            });
        }
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn discard(reason: String) -> StopOutcome {
    warn!("Discarding recorded audio: {}", reason);
    StopOutcome::Discarded { reason }
}
