use super::messages::{
    EngagementData, RemoteSession, ReportMetadata, SessionReport, SummaryStatistics, TimelinePoint,
};
use super::service::RemoteEngagementService;
use crate::engagement::{synthesize_sample, EngagementSample, EngagementState, SampleSource};
use crate::error::RemoteError;
use crate::recorder::AudioArtifact;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tracing::info;

struct SimulatedSession {
    lecture_name: String,
    started_at: DateTime<Utc>,
    samples: Vec<EngagementSample>,
}

/// In-process stand-in for the analytics backend.
///
/// Sessions live in memory; every sample it serves is recorded on the
/// session timeline and summarized when the session is stopped.
#[derive(Default)]
pub struct SimulatedEngagementService {
    sessions: Mutex<HashMap<String, SimulatedSession>>,
}

impl SimulatedEngagementService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        crate::sync::lock(&self.sessions).len()
    }

    fn not_found(session_id: &str) -> RemoteError {
        RemoteError::SessionNotFound(format!("Session not found: {}", session_id))
    }
}

#[async_trait::async_trait]
impl RemoteEngagementService for SimulatedEngagementService {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn health(&self) -> bool {
        true
    }

    async fn create_session(&self, lecture_name: &str) -> Result<RemoteSession, RemoteError> {
        let session = RemoteSession {
            session_id: format!("sim-{}", uuid::Uuid::new_v4()),
            lecture_name: lecture_name.to_string(),
            created_at: Utc::now(),
        };

        crate::sync::lock(&self.sessions).insert(
            session.session_id.clone(),
            SimulatedSession {
                lecture_name: lecture_name.to_string(),
                started_at: session.created_at,
                samples: Vec::new(),
            },
        );

        info!("Simulated session created: {}", session.session_id);
        Ok(session)
    }

    async fn current_sample(&self, session_id: &str) -> Result<EngagementSample, RemoteError> {
        let mut sessions = crate::sync::lock(&self.sessions);
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;

        let sample = synthesize_sample(&mut rand::thread_rng(), SampleSource::Remote);
        session.samples.push(sample.clone());

        Ok(sample)
    }

    async fn stop_session(
        &self,
        session_id: &str,
        artifact: &AudioArtifact,
    ) -> Result<SessionReport, RemoteError> {
        let session = crate::sync::lock(&self.sessions)
            .remove(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;

        let ended_at = Utc::now();
        let report = SessionReport {
            session_id: Some(session_id.to_string()),
            engagement_data: Some(summarize(&session, ended_at)),
            transcript: Value::Array(Vec::new()),
            audio_file: Some(json!({
                "exists": true,
                "format": format!(".{}", artifact.file_extension()),
                "size": artifact.len(),
            })),
            extra: Default::default(),
        };

        info!(
            "Simulated session {} stopped ({} samples, {} audio bytes)",
            session_id,
            session.samples.len(),
            artifact.len()
        );

        Ok(report)
    }
}

fn summarize(session: &SimulatedSession, ended_at: DateTime<Utc>) -> EngagementData {
    let timeline: Vec<TimelinePoint> = session
        .samples
        .iter()
        .map(|sample| TimelinePoint {
            timestamp: sample.captured_at.to_rfc3339(),
            elapsed_seconds: (sample.captured_at - session.started_at).num_milliseconds() as f64
                / 1000.0,
            scores: sample.scores,
        })
        .collect();

    let mut avg_scores = BTreeMap::new();
    if !timeline.is_empty() {
        for state in EngagementState::ALL {
            let sum: f64 = timeline.iter().map(|p| p.scores.get(state)).sum();
            let avg = sum / timeline.len() as f64;
            avg_scores.insert(state.as_str().to_string(), (avg * 100.0).round() / 100.0);
        }
    }

    EngagementData {
        metadata: Some(ReportMetadata {
            lecture_name: Some(session.lecture_name.clone()),
            start_time: Some(session.started_at.to_rfc3339()),
            end_time: Some(ended_at.to_rfc3339()),
            duration_seconds: Some(
                (ended_at - session.started_at).num_milliseconds() as f64 / 1000.0,
            ),
            total_data_points: Some(timeline.len()),
        }),
        engagement_timeline: timeline,
        summary_statistics: Some(SummaryStatistics {
            avg_scores,
            key_moments: json!({ "confusion_peaks": [], "boredom_periods": [] }),
        }),
    }
}
