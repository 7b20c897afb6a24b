use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a monitoring session.
///
/// `Idle → Starting → Recording → Stopping → Finalizing → Idle`; a failed
/// acquisition goes `Starting → Idle` and teardown goes `Recording → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Idle,
    Starting,
    Recording,
    Stopping,
    Finalizing,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Finalizing => "finalizing",
        }
    }

    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Recording)
                | (Starting, Idle)
                | (Recording, Stopping)
                | (Recording, Idle)
                | (Stopping, Finalizing)
                | (Finalizing, Idle)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
