use super::client::BackendClient;
use super::messages::{RemoteSession, SessionReport, StartSessionRequest};
use super::service::RemoteEngagementService;
use crate::config::{BackendConfig, TimeoutTable};
use crate::engagement::EngagementSample;
use crate::error::RemoteError;
use crate::recorder::AudioArtifact;
use anyhow::Result;
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument, warn};

/// Engagement backend over HTTP
pub struct HttpEngagementService {
    client: BackendClient,
    timeouts: TimeoutTable,
}

impl HttpEngagementService {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Ok(Self {
            client: BackendClient::new(&config.base_url)?,
            timeouts: config.timeouts.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait::async_trait]
impl RemoteEngagementService for HttpEngagementService {
    fn name(&self) -> &str {
        "http"
    }

    async fn health(&self) -> bool {
        match self.client.get("/health", self.timeouts.health()).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Backend health check failed: {}", e);
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn create_session(&self, lecture_name: &str) -> Result<RemoteSession, RemoteError> {
        let request = StartSessionRequest {
            lecture_name: lecture_name.to_string(),
        };

        let body = self
            .client
            .post_json("/engagement/start", &request, self.timeouts.start_session())
            .await?;

        let session = RemoteSession::parse(&body, lecture_name)?;
        info!("Backend session created: {}", session.session_id);

        Ok(session)
    }

    async fn current_sample(&self, session_id: &str) -> Result<EngagementSample, RemoteError> {
        let body = self
            .client
            .get(
                &format!("/engagement/current/{}", session_id),
                self.timeouts.current_sample(),
            )
            .await?;

        Ok(EngagementSample::parse_remote(&body)?)
    }

    #[instrument(skip(self, artifact), fields(bytes = artifact.len(), mime = artifact.mime_type()))]
    async fn stop_session(
        &self,
        session_id: &str,
        artifact: &AudioArtifact,
    ) -> Result<SessionReport, RemoteError> {
        let upload = artifact
            .upload_payload()
            .map_err(|e| RemoteError::Encode(e.to_string()))?;

        let part = Part::bytes(upload.data).file_name(upload.file_name);
        let part = match part.mime_str(&upload.mime_type) {
            Ok(part) => part,
            Err(e) => return Err(RemoteError::Encode(e.to_string())),
        };

        let form = Form::new()
            .text("session_id", session_id.to_string())
            .part("audio", part);

        let body = self
            .client
            .post_form("/engagement/stop", form, self.timeouts.stop_session())
            .await?;

        let report = SessionReport::parse(&body)?;
        info!(
            "Backend accepted recording for session {} ({} timeline points)",
            session_id,
            report.timeline_len()
        );

        Ok(report)
    }
}
