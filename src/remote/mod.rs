//! Engagement backend
//!
//! The coordinator talks to the backend through `RemoteEngagementService`;
//! `HttpEngagementService` is the networked implementation and
//! `SimulatedEngagementService` an in-process one. `AnalyticsClient` wraps
//! the AI-backed endpoints used after a session.

mod analytics;
mod client;
mod http;
pub mod messages;
mod service;
mod simulated;

pub use analytics::{AnalyticsClient, AnalyticsKind};
pub use http::HttpEngagementService;
pub use messages::{
    EngagementData, RemoteSession, ReportMetadata, SessionReport, SummaryStatistics,
    TimelinePoint,
};
pub use service::RemoteEngagementService;
pub use simulated::SimulatedEngagementService;

use crate::config::{BackendConfig, BackendMode};
use anyhow::Result;
use std::sync::Arc;

/// Build the backend selected by configuration
pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn RemoteEngagementService>> {
    Ok(match config.mode {
        BackendMode::Http => Arc::new(HttpEngagementService::new(config)?),
        BackendMode::Simulated => Arc::new(SimulatedEngagementService::new()),
    })
}
