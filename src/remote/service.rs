use super::messages::{RemoteSession, SessionReport};
use crate::engagement::EngagementSample;
use crate::error::RemoteError;
use crate::recorder::AudioArtifact;

/// Engagement backend capability.
///
/// Implementations:
/// - `HttpEngagementService`: the networked analytics backend
/// - `SimulatedEngagementService`: in-process, for offline use
#[async_trait::async_trait]
pub trait RemoteEngagementService: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Opportunistic reachability check; never required
    async fn health(&self) -> bool;

    /// Create a session for a lecture
    async fn create_session(&self, lecture_name: &str) -> Result<RemoteSession, RemoteError>;

    /// Latest engagement reading for a session
    async fn current_sample(&self, session_id: &str) -> Result<EngagementSample, RemoteError>;

    /// Finish a session, uploading the recorded audio
    async fn stop_session(
        &self,
        session_id: &str,
        artifact: &AudioArtifact,
    ) -> Result<SessionReport, RemoteError>;
}
