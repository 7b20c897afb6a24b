//! HTTP control API over one session coordinator
//!
//! - POST /monitor/start - Acquire devices and start recording
//! - POST /monitor/stop - Stop recording and submit the audio
//! - GET /monitor/status - Lifecycle state, display and latest sample
//! - DELETE /monitor/error - Dismiss the current error
//! - GET /backend/health - Engagement backend reachability
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, StartMonitorResponse, StopMonitorResponse};
pub use routes::create_router;
pub use state::AppState;
