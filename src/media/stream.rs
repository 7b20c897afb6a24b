use super::constraints::FacingMode;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Media track type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Capabilities the platform actually granted for a track
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackSettings {
    Video {
        width: u32,
        height: u32,
        facing_mode: FacingMode,
    },
    Audio {
        sample_rate: u32,
        channels: u16,
        echo_cancellation: bool,
        noise_suppression: bool,
    },
}

/// A single device track.
///
/// Clones share the same live flag, so the platform that issued the track can
/// observe when the owner stops it (this is what drives the hardware
/// indicator).
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    label: String,
    settings: TrackSettings,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>, settings: TrackSettings) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            settings,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop the track. Safe to call more than once.
    pub fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// A set of tracks handed out together
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_tracks().next().is_some()
    }

    pub fn has_video(&self) -> bool {
        self.video_tracks().next().is_some()
    }

    /// True while any track is still live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Split into (video-only, audio-only) streams
    pub fn split(self) -> (MediaStream, MediaStream) {
        let (audio, video): (Vec<_>, Vec<_>) = self
            .tracks
            .into_iter()
            .partition(|t| t.kind == TrackKind::Audio);

        (MediaStream::new(video), MediaStream::new(audio))
    }
}
