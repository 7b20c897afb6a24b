pub mod config;
pub mod engagement;
pub mod error;
pub mod http;
pub mod media;
pub mod recorder;
pub mod remote;
pub mod session;

mod sync;

pub use config::Config;
pub use engagement::{
    Emotion, EngagementSample, EngagementSampler, EngagementScores, EngagementState, LatestSample,
};
pub use error::{DeviceError, DeviceErrorKind, ParseError, RecorderError, RemoteError};
pub use http::{create_router, AppState};
pub use media::{MediaAcquisition, MediaConstraints, MediaDevices, SyntheticDevices};
pub use recorder::{AudioArtifact, AudioRecorder};
pub use remote::{
    AnalyticsClient, HttpEngagementService, RemoteEngagementService, SessionReport,
    SimulatedEngagementService,
};
pub use session::{
    LifecycleState, SessionConfig, SessionCoordinator, SessionStore, StartOutcome, StopOutcome,
};
