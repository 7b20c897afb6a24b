use crate::media::MediaConstraints;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub monitor: MonitorConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "engagement-monitor".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8700,
        }
    }
}

/// Which backend implementation to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    #[default]
    Http,
    Simulated,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub mode: BackendMode,
    /// Base URL of the engagement API, including its path prefix
    pub base_url: String,
    pub timeouts: TimeoutTable,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Http,
            base_url: "http://localhost:8000/api".to_string(),
            timeouts: TimeoutTable::default(),
        }
    }
}

/// Per-call timeouts in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutTable {
    pub start_session_ms: u64,
    pub current_sample_ms: u64,
    pub stop_session_ms: u64,
    pub health_ms: u64,
    pub data_ms: u64,
    /// AI-backed generation calls (summary, MCQs, report, plan)
    pub generation_ms: u64,
}

impl Default for TimeoutTable {
    fn default() -> Self {
        Self {
            start_session_ms: 5_000,
            current_sample_ms: 3_000,
            stop_session_ms: 30_000,
            health_ms: 5_000,
            data_ms: 5_000,
            generation_ms: 30_000,
        }
    }
}

impl TimeoutTable {
    pub fn start_session(&self) -> Duration {
        Duration::from_millis(self.start_session_ms)
    }

    pub fn current_sample(&self) -> Duration {
        Duration::from_millis(self.current_sample_ms)
    }

    pub fn stop_session(&self) -> Duration {
        Duration::from_millis(self.stop_session_ms)
    }

    pub fn health(&self) -> Duration {
        Duration::from_millis(self.health_ms)
    }

    pub fn data(&self) -> Duration {
        Duration::from_millis(self.data_ms)
    }

    pub fn generation(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub lecture_name: String,
    pub sample_interval_ms: u64,
    pub elapsed_tick_ms: u64,
    pub recorder_timeslice_ms: u64,
    pub flush_grace_ms: u64,
    /// Keep a local copy of every finalized recording here
    pub archive_dir: Option<PathBuf>,
    pub constraints: MediaConstraints,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            lecture_name: "Live Lecture".to_string(),
            sample_interval_ms: 2_000,
            elapsed_tick_ms: 1_000,
            recorder_timeslice_ms: 1_000,
            flush_grace_ms: 1_000,
            archive_dir: None,
            constraints: MediaConstraints::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Durable session slot; defaults to the user data directory
    pub session_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn session_file(&self) -> Option<PathBuf> {
        self.session_file.clone().or_else(|| {
            dirs::data_local_dir().map(|d| d.join("engagement-monitor").join("session.json"))
        })
    }
}

impl Config {
    /// Load `path` (any format the config crate knows; optional) overlaid by
    /// `ENGAGEMENT__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ENGAGEMENT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
