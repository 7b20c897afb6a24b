//! Error types shared across the monitoring pipeline
//!
//! Device and recorder errors come from the local media platform, remote
//! errors from the analytics backend, and parse errors from validating
//! backend payloads before they reach the rest of the crate.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Raw error reported by a media platform, modelled on DOMException
/// (`name` is the exception name, e.g. "NotAllowedError").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct PlatformError {
    pub name: String,
    pub message: String,
}

impl PlatformError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Why media acquisition failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceErrorKind {
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    ApiUnavailable,
    Unknown,
}

impl DeviceErrorKind {
    /// Map a platform error onto exactly one kind.
    pub fn classify(error: &PlatformError) -> Self {
        match error.name.as_str() {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                Self::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" => Self::DeviceNotFound,
            "NotReadableError" | "TrackStartError" => Self::DeviceBusy,
            "NotSupportedError" => Self::ApiUnavailable,
            _ if error.message.contains("not available") => Self::ApiUnavailable,
            _ => Self::Unknown,
        }
    }
}

/// Media acquisition failure, fatal to starting a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {detail}")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub detail: String,
}

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Human-readable message with a remediation hint
    pub fn user_message(&self) -> String {
        match self.kind {
            DeviceErrorKind::PermissionDenied => {
                "Camera access denied. Please allow camera and microphone access in your system settings."
                    .to_string()
            }
            DeviceErrorKind::DeviceNotFound => {
                "No camera found. Please connect a camera and try again.".to_string()
            }
            DeviceErrorKind::DeviceBusy => {
                "Camera is already in use by another app. Please close other apps using the camera."
                    .to_string()
            }
            DeviceErrorKind::ApiUnavailable => {
                "Camera API not available on this device.".to_string()
            }
            DeviceErrorKind::Unknown => format!("Failed to start camera: {}", self.detail),
        }
    }
}

impl From<PlatformError> for DeviceError {
    fn from(error: PlatformError) -> Self {
        let kind = DeviceErrorKind::classify(&error);
        Self::new(kind, error.to_string())
    }
}

/// Audio recorder could not be started. Recording continues video-only.
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error("MediaRecorder API not supported")]
    Unsupported,

    #[error("no audio track to record")]
    NoAudioTrack,

    #[error("failed to create recorder: {0}")]
    Create(String),

    #[error("failed to start recorder: {0}")]
    Start(String),
}

/// Malformed payload at the backend boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid score for {field}: {value}")]
    InvalidScore { field: &'static str, value: f64 },

    #[error("engagement scores are all zero")]
    EmptyScores,

    #[error("unknown engagement state: {0}")]
    UnknownState(String),

    #[error("unknown emotion: {0}")]
    UnknownEmotion(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Failure talking to the engagement backend
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("cannot connect to backend: {0}")]
    Unavailable(String),

    #[error("request timeout - backend may not be available")]
    Timeout,

    #[error("{0}")]
    SessionNotFound(String),

    #[error("server error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("failed to encode audio upload: {0}")]
    Encode(String),

    #[error("invalid response from backend: {0}")]
    Parse(#[from] ParseError),
}

impl RemoteError {
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_))
    }

    /// Build an error from a non-2xx response body. The body may be a JSON
    /// `{"error": "..."}` object or plain text.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = error_message_from_body(status, body);
        if status == 404 && message.contains("Session not found") {
            Self::SessionNotFound(message)
        } else {
            Self::Status { status, message }
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

fn error_message_from_body(status: u16, body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: String,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return parsed.error;
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("HTTP error! status: {}", status)
    } else {
        text.to_string()
    }
}

/// Durable session slot errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read session slot {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write session slot {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt session slot {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_platform_error_once() {
        let cases = [
            ("NotAllowedError", "", DeviceErrorKind::PermissionDenied),
            ("PermissionDeniedError", "", DeviceErrorKind::PermissionDenied),
            ("NotFoundError", "", DeviceErrorKind::DeviceNotFound),
            ("DevicesNotFoundError", "", DeviceErrorKind::DeviceNotFound),
            ("NotReadableError", "", DeviceErrorKind::DeviceBusy),
            ("TrackStartError", "", DeviceErrorKind::DeviceBusy),
            ("TypeError", "Camera API not available", DeviceErrorKind::ApiUnavailable),
            ("OverconstrainedError", "width", DeviceErrorKind::Unknown),
        ];

        for (name, message, expected) in cases {
            let error = PlatformError::new(name, message);
            assert_eq!(DeviceErrorKind::classify(&error), expected, "{}", name);
        }
    }

    #[test]
    fn test_unknown_message_includes_detail() {
        let error = DeviceError::from(PlatformError::new("AbortError", "hardware fault"));
        assert_eq!(error.kind, DeviceErrorKind::Unknown);
        assert!(error.user_message().contains("hardware fault"));
    }

    #[test]
    fn test_error_body_json_and_plain_text() {
        let json = RemoteError::from_response(404, br#"{"error": "Session not found"}"#);
        assert!(json.is_session_not_found());

        let plain = RemoteError::from_response(404, b"Session not found: abc");
        assert!(plain.is_session_not_found());

        match RemoteError::from_response(500, b"") {
            RemoteError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "HTTP error! status: 500");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
