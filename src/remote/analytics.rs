use super::client::BackendClient;
use crate::config::{BackendConfig, TimeoutTable};
use crate::error::RemoteError;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// Analytics products generated by the backend after a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnalyticsKind {
    /// Raw engagement export
    Engagement,
    /// Sentiment timeline for graphs
    Timeline,
    /// Lecture summary from the transcript
    Summary,
    /// Multiple-choice questions
    Mcqs,
    /// Learner report
    Report,
    /// Study plan
    Plan,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    session_id: &'a str,
}

#[derive(Serialize)]
struct ResultsRequest<'a> {
    session_id: &'a str,
    mcq_results: &'a [Value],
}

/// Client for the AI/analytics endpoints. Payloads are opaque JSON.
pub struct AnalyticsClient {
    client: BackendClient,
    timeouts: TimeoutTable,
}

impl AnalyticsClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Ok(Self {
            client: BackendClient::new(&config.base_url)?,
            timeouts: config.timeouts.clone(),
        })
    }

    /// Fetch any analytics product by kind
    pub async fn fetch(
        &self,
        kind: AnalyticsKind,
        session_id: &str,
        mcq_results: &[Value],
    ) -> Result<Value, RemoteError> {
        info!("Requesting {:?} for session {}", kind, session_id);

        match kind {
            AnalyticsKind::Engagement => self.engagement_data(session_id).await,
            AnalyticsKind::Timeline => self.sentiment_timeline(session_id).await,
            AnalyticsKind::Summary => self.lecture_summary(session_id).await,
            AnalyticsKind::Mcqs => self.mcqs(session_id).await,
            AnalyticsKind::Report => self.user_report(session_id, mcq_results).await,
            AnalyticsKind::Plan => self.study_plan(session_id, mcq_results).await,
        }
    }

    pub async fn engagement_data(&self, session_id: &str) -> Result<Value, RemoteError> {
        self.get(&format!("/engagement/data/{}", session_id), self.timeouts.data())
            .await
    }

    pub async fn sentiment_timeline(&self, session_id: &str) -> Result<Value, RemoteError> {
        self.get(&format!("/sentiment-timeline/{}", session_id), self.timeouts.data())
            .await
    }

    pub async fn lecture_summary(&self, session_id: &str) -> Result<Value, RemoteError> {
        self.post("/lecture/summary", &SessionRequest { session_id })
            .await
    }

    pub async fn mcqs(&self, session_id: &str) -> Result<Value, RemoteError> {
        self.post("/lecture/mcqs", &SessionRequest { session_id }).await
    }

    pub async fn user_report(
        &self,
        session_id: &str,
        mcq_results: &[Value],
    ) -> Result<Value, RemoteError> {
        self.post(
            "/report/generate",
            &ResultsRequest {
                session_id,
                mcq_results,
            },
        )
        .await
    }

    pub async fn study_plan(
        &self,
        session_id: &str,
        mcq_results: &[Value],
    ) -> Result<Value, RemoteError> {
        self.post(
            "/plan/generate",
            &ResultsRequest {
                session_id,
                mcq_results,
            },
        )
        .await
    }

    async fn get(&self, path: &str, timeout: Duration) -> Result<Value, RemoteError> {
        let body = self.client.get(path, timeout).await?;
        parse_json(&body)
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Value, RemoteError> {
        let body = self
            .client
            .post_json(path, body, self.timeouts.generation())
            .await?;
        parse_json(&body)
    }
}

fn parse_json(body: &[u8]) -> Result<Value, RemoteError> {
    serde_json::from_slice(body).map_err(|e| RemoteError::Parse(e.into()))
}
