use serde::{Deserialize, Serialize};

/// Which camera the platform should prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera
    #[default]
    User,
    /// Back camera
    Environment,
}

/// Video constraints. Values are ideals; the platform may substitute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub max_width: u32,
    pub ideal_height: u32,
    pub max_height: u32,
    pub facing_mode: FacingMode,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 640,
            max_width: 1280,
            ideal_height: 480,
            max_height: 720,
            facing_mode: FacingMode::User,
        }
    }
}

/// Audio processing hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub sample_rate: u32,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            sample_rate: 44100,
        }
    }
}

/// Camera + microphone request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub video: VideoConstraints,
    pub audio: AudioConstraints,
}
