use crate::engagement::{Emotion, EngagementSample, EngagementScores, EngagementState, SampleSource};
use crate::error::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body of `POST /engagement/start`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub lecture_name: String,
}

/// Response of `POST /engagement/start`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    #[serde(rename = "sessionId", alias = "session_id", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A session known to the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteSession {
    pub session_id: String,
    pub lecture_name: String,
    pub created_at: DateTime<Utc>,
}

impl RemoteSession {
    pub fn from_response(
        response: StartSessionResponse,
        lecture_name: &str,
    ) -> Result<Self, ParseError> {
        let session_id = response
            .session_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ParseError::MissingField("session_id"))?;

        Ok(Self {
            session_id,
            lecture_name: lecture_name.to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn parse(body: &[u8], lecture_name: &str) -> Result<Self, ParseError> {
        let response: StartSessionResponse = serde_json::from_slice(body)?;
        Self::from_response(response, lecture_name)
    }
}

/// Scores as sent by the backend; any field may be missing
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScoresMessage {
    pub concentrated: Option<f64>,
    pub engaged: Option<f64>,
    pub confused: Option<f64>,
    pub bored: Option<f64>,
}

/// Response of `GET /engagement/current/{session_id}`
#[derive(Debug, Serialize, Deserialize)]
pub struct SampleMessage {
    pub scores: Option<ScoresMessage>,
    pub state: Option<String>,
    pub emotion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl TryFrom<SampleMessage> for EngagementSample {
    type Error = ParseError;

    fn try_from(message: SampleMessage) -> Result<Self, Self::Error> {
        let scores = message.scores.ok_or(ParseError::MissingField("scores"))?;
        let scores = EngagementScores {
            concentrated: scores
                .concentrated
                .ok_or(ParseError::MissingField("scores.concentrated"))?,
            engaged: scores
                .engaged
                .ok_or(ParseError::MissingField("scores.engaged"))?,
            confused: scores
                .confused
                .ok_or(ParseError::MissingField("scores.confused"))?,
            bored: scores.bored.ok_or(ParseError::MissingField("scores.bored"))?,
        }
        .normalized()?;

        let state: EngagementState = message
            .state
            .ok_or(ParseError::MissingField("state"))?
            .parse()?;
        let emotion: Emotion = message
            .emotion
            .ok_or(ParseError::MissingField("emotion"))?
            .parse()?;

        Ok(EngagementSample {
            scores,
            state,
            emotion,
            source: SampleSource::Remote,
            captured_at: Utc::now(),
        })
    }
}

impl EngagementSample {
    /// Parse and validate a backend sample payload
    pub fn parse_remote(body: &[u8]) -> Result<Self, ParseError> {
        let message: SampleMessage = serde_json::from_slice(body)?;
        Self::try_from(message)
    }
}

/// Recording metadata in a session report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub lecture_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_seconds: Option<f64>,
    pub total_data_points: Option<usize>,
}

/// One point on the engagement timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: String,
    #[serde(default)]
    pub elapsed_seconds: f64,
    pub scores: EngagementScores,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryStatistics {
    pub avg_scores: BTreeMap<String, f64>,
    pub key_moments: Value,
}

/// Engagement analysis of a finished session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementData {
    pub metadata: Option<ReportMetadata>,
    pub engagement_timeline: Vec<TimelinePoint>,
    pub summary_statistics: Option<SummaryStatistics>,
}

/// Response of `POST /engagement/stop`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(rename = "sessionId", alias = "session_id", default)]
    pub session_id: Option<String>,
    #[serde(rename = "engagementData", default)]
    pub engagement_data: Option<EngagementData>,
    #[serde(default)]
    pub transcript: Value,
    #[serde(rename = "audioFile", default)]
    pub audio_file: Option<Value>,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionReport {
    /// Parse a stop response. Accepts the nested `engagementData` shape and
    /// the flat shape with `engagement_timeline` at top level.
    pub fn parse(body: &[u8]) -> Result<Self, ParseError> {
        let mut report: SessionReport = serde_json::from_slice(body)?;

        if report.engagement_data.is_none() && report.extra.contains_key("engagement_timeline") {
            let mut flat = Map::new();
            for key in ["metadata", "engagement_timeline", "summary_statistics"] {
                if let Some(value) = report.extra.remove(key) {
                    flat.insert(key.to_string(), value);
                }
            }
            report.engagement_data = Some(serde_json::from_value(Value::Object(flat))?);
        }

        Ok(report)
    }

    pub fn timeline_len(&self) -> usize {
        self.engagement_data
            .as_ref()
            .map(|d| d.engagement_timeline.len())
            .unwrap_or(0)
    }
}
