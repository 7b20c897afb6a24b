use crate::error::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Learner engagement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementState {
    Concentrated,
    Engaged,
    Confused,
    Bored,
}

impl EngagementState {
    pub const ALL: [EngagementState; 4] = [
        EngagementState::Concentrated,
        EngagementState::Engaged,
        EngagementState::Confused,
        EngagementState::Bored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concentrated => "concentrated",
            Self::Engaged => "engaged",
            Self::Confused => "confused",
            Self::Bored => "bored",
        }
    }
}

impl FromStr for EngagementState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| ParseError::UnknownState(s.to_string()))
    }
}

impl fmt::Display for EngagementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dominant facial emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Surprise,
    Fear,
    Angry,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Fear,
        Emotion::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprise => "surprise",
            Self::Fear => "fear",
            Self::Angry => "angry",
        }
    }
}

impl FromStr for Emotion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|emotion| emotion.as_str() == normalized)
            .ok_or_else(|| ParseError::UnknownEmotion(s.to_string()))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score per engagement state, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementScores {
    pub concentrated: f64,
    pub engaged: f64,
    pub confused: f64,
    pub bored: f64,
}

impl EngagementScores {
    pub fn get(&self, state: EngagementState) -> f64 {
        match state {
            EngagementState::Concentrated => self.concentrated,
            EngagementState::Engaged => self.engaged,
            EngagementState::Confused => self.confused,
            EngagementState::Bored => self.bored,
        }
    }

    pub fn total(&self) -> f64 {
        self.concentrated + self.engaged + self.confused + self.bored
    }

    /// State with the highest score
    pub fn dominant(&self) -> EngagementState {
        EngagementState::ALL
            .into_iter()
            .fold(EngagementState::Concentrated, |best, state| {
                if self.get(state) > self.get(best) {
                    state
                } else {
                    best
                }
            })
    }

    /// Rescale so the four scores sum to 100.
    ///
    /// Every score must be finite and nonnegative and the total positive.
    pub fn normalized(self) -> Result<Self, ParseError> {
        for state in EngagementState::ALL {
            let value = self.get(state);
            if !value.is_finite() || value < 0.0 {
                return Err(ParseError::InvalidScore {
                    field: state.as_str(),
                    value,
                });
            }
        }

        let total = self.total();
        if total <= 0.0 {
            return Err(ParseError::EmptyScores);
        }

        let scale = 100.0 / total;
        Ok(Self {
            concentrated: self.concentrated * scale,
            engaged: self.engaged * scale,
            confused: self.confused * scale,
            bored: self.bored * scale,
        })
    }
}

/// Where a sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSource {
    Local,
    Remote,
}

/// One engagement reading. Scores sum to ~100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementSample {
    pub scores: EngagementScores,
    pub state: EngagementState,
    pub emotion: Emotion,
    pub source: SampleSource,
    pub captured_at: DateTime<Utc>,
}
