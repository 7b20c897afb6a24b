//! Local media devices
//!
//! Camera/microphone acquisition behind the `MediaDevices` platform trait,
//! separated audio/video streams, and a synthetic platform.

pub mod acquisition;
pub mod constraints;
pub mod platform;
pub mod stream;
pub mod synthetic;

pub use acquisition::{MediaAcquisition, MediaSession};
pub use constraints::{AudioConstraints, FacingMode, MediaConstraints, VideoConstraints};
pub use platform::{MediaDevices, MediaRecorder, RecorderEvent, RecorderState};
pub use stream::{MediaStream, MediaTrack, TrackKind, TrackSettings};
pub use synthetic::{FlushBehavior, SyntheticConfig, SyntheticDevices};
