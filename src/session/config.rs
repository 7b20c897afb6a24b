use crate::config::MonitorConfig;
use crate::media::MediaConstraints;
use crate::recorder::RecorderConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a session coordinator
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lecture name sent when creating a backend session
    pub lecture_name: String,

    /// Engagement sampling period
    /// Default: 2 seconds
    pub sample_interval: Duration,

    /// Elapsed-time display refresh
    pub elapsed_tick: Duration,

    pub recorder: RecorderConfig,

    pub constraints: MediaConstraints,

    /// Keep a local copy of every finalized recording here
    pub archive_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for SessionConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            lecture_name: config.lecture_name.clone(),
            sample_interval: Duration::from_millis(config.sample_interval_ms),
            elapsed_tick: Duration::from_millis(config.elapsed_tick_ms),
            recorder: RecorderConfig {
                timeslice: Duration::from_millis(config.recorder_timeslice_ms),
                flush_grace: Duration::from_millis(config.flush_grace_ms),
            },
            constraints: config.constraints.clone(),
            archive_dir: config.archive_dir.clone(),
        }
    }
}
