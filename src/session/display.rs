use crate::media::{MediaStream, TrackSettings};
use crate::remote::SessionReport;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// What the preview surface shows: the video-only stream, muted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoPreview {
    pub stream_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub muted: bool,
}

impl VideoPreview {
    pub fn from_stream(stream: &MediaStream) -> Self {
        let (width, height) = stream
            .video_tracks()
            .find_map(|t| match t.settings() {
                TrackSettings::Video { width, height, .. } => Some((*width, *height)),
                _ => None,
            })
            .unzip();

        Self {
            stream_id: stream.id().to_string(),
            width,
            height,
            muted: true,
        }
    }
}

/// Everything the UI renders for a monitoring session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    pub is_recording: bool,
    pub is_loading: bool,
    pub elapsed_secs: u64,
    pub preview: Option<VideoPreview>,
    /// Most recent failure; one at a time, dismissible
    pub error: Option<String>,
    /// Non-fatal notice such as video-only recording
    pub warning: Option<String>,
    /// Report returned by the last successful submission
    pub last_report: Option<SessionReport>,
}

impl DisplaySnapshot {
    pub fn elapsed(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }
}

/// Observable display state shared by the coordinator and its timers
#[derive(Clone)]
pub struct DisplayState {
    tx: Arc<watch::Sender<DisplaySnapshot>>,
}

impl DisplayState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DisplaySnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.tx.subscribe()
    }

    pub fn update(&self, f: impl FnOnce(&mut DisplaySnapshot)) {
        self.tx.send_modify(f);
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|d| d.error = Some(message));
    }

    pub fn clear_error(&self) {
        self.update(|d| d.error = None);
    }

    pub fn set_warning(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|d| d.warning = Some(message));
    }

    pub fn set_elapsed(&self, secs: u64) {
        self.tx.send_if_modified(|d| {
            if d.elapsed_secs == secs {
                return false;
            }
            d.elapsed_secs = secs;
            true
        });
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

/// `MM:SS`, minutes growing past 59
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
