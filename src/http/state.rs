use crate::remote::RemoteEngagementService;
use crate::session::SessionCoordinator;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single monitoring session this service drives
    pub coordinator: Arc<SessionCoordinator>,

    /// Backend, for reachability reporting
    pub remote: Arc<dyn RemoteEngagementService>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        remote: Arc<dyn RemoteEngagementService>,
    ) -> Self {
        Self {
            coordinator,
            remote,
        }
    }
}
