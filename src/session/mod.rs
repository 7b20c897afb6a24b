//! Monitoring session lifecycle
//!
//! `SessionCoordinator` owns the device session, the recorder, the elapsed
//! timer and the engagement sampler for one recording at a time, keeps the
//! backend session id in memory and in a durable `SessionStore`, and
//! publishes what the UI shows through `DisplayState`.

mod config;
mod coordinator;
mod display;
mod state;
mod store;

pub use config::SessionConfig;
pub use coordinator::{MonitorStatus, SessionCoordinator, StartOutcome, StopOutcome};
pub use display::{format_elapsed, DisplaySnapshot, DisplayState, VideoPreview};
pub use state::LifecycleState;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
