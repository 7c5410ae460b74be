use serde::{Deserialize, Serialize};

use crate::error::ErrorReport;
use crate::session::SessionStatus;

/// Source tag identifying which context produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSource {
    #[serde(rename = "meetcap-extension")]
    Extension,
    #[serde(rename = "meetcap-web-app")]
    WebApp,
}

/// Message payloads, one typed variant per action.
///
/// The action name is the dispatch tag; payload fields carry only what
/// that action needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    // Requests from the web app
    TestConnection,
    StartRecording,
    StopRecording,
    GetRecordingStatus,
    GetRecordingData,
    ClearRecordingData,

    // Notifications and responses toward the web app
    ExtensionInstalled {
        timestamp: i64,
    },
    RecordingStarted {
        timestamp: i64,
    },
    RecordingStopped {
        timestamp: i64,
    },
    RecordingResumed {
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    RecordingError {
        error: String,
        code: String,
        recoverable: bool,
    },
    #[serde(rename_all = "camelCase")]
    RecordingComplete {
        size: u64,
        mime_type: String,
        timestamp: i64,
    },
    RecordingStatusResponse {
        success: bool,
        status: Option<SessionStatus>,
    },
    #[serde(rename_all = "camelCase")]
    RecordingDataResponse {
        success: bool,
        size: Option<u64>,
        mime_type: Option<String>,
        error: Option<String>,
    },
    ClearRecordingDataResponse {
        success: bool,
    },
}

impl Action {
    /// The action name used as the dispatch key.
    pub fn name(&self) -> &'static str {
        match self {
            Action::TestConnection => "testConnection",
            Action::StartRecording => "startRecording",
            Action::StopRecording => "stopRecording",
            Action::GetRecordingStatus => "getRecordingStatus",
            Action::GetRecordingData => "getRecordingData",
            Action::ClearRecordingData => "clearRecordingData",
            Action::ExtensionInstalled { .. } => "extensionInstalled",
            Action::RecordingStarted { .. } => "recordingStarted",
            Action::RecordingStopped { .. } => "recordingStopped",
            Action::RecordingResumed { .. } => "recordingResumed",
            Action::RecordingError { .. } => "recordingError",
            Action::RecordingComplete { .. } => "recordingComplete",
            Action::RecordingStatusResponse { .. } => "recordingStatusResponse",
            Action::RecordingDataResponse { .. } => "recordingDataResponse",
            Action::ClearRecordingDataResponse { .. } => "clearRecordingDataResponse",
        }
    }

    pub fn error(report: ErrorReport) -> Self {
        Action::RecordingError {
            error: report.message,
            code: report.code,
            recoverable: report.recoverable,
        }
    }
}

/// A message on the wire: source tag plus the action-tagged payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub source: MessageSource,
    #[serde(flatten)]
    pub action: Action,
}

/// A message arriving on the page transport. Messages posted from other
/// windows carry `same_window = false` and are never dispatched.
#[derive(Debug, Clone)]
pub struct WindowMessage {
    pub same_window: bool,
    pub payload: serde_json::Value,
}

/// Outgoing request action -> the response action it is paired with, by
/// convention (no correlation ids; replies arrive asynchronously under
/// the paired name).
pub const ACTION_PAIRINGS: &[(&str, &str)] = &[
    ("testConnection", "extensionInstalled"),
    ("startRecording", "recordingStarted"),
    ("stopRecording", "recordingStopped"),
    ("getRecordingStatus", "recordingStatusResponse"),
    ("getRecordingData", "recordingDataResponse"),
    ("clearRecordingData", "clearRecordingDataResponse"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tag_round_trip() {
        let envelope = Envelope {
            source: MessageSource::WebApp,
            action: Action::StartRecording,
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["source"], "meetcap-web-app");
        assert_eq!(json["action"], "startRecording");

        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back.action.name(), "startRecording");
    }

    #[test]
    fn test_payload_fields_are_camel_case() {
        let envelope = Envelope {
            source: MessageSource::Extension,
            action: Action::RecordingComplete {
                size: 3072,
                mime_type: "video/webm".to_string(),
                timestamp: 1_000,
            },
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["action"], "recordingComplete");
        assert_eq!(json["mimeType"], "video/webm");
        assert_eq!(json["size"], 3072);
    }

    #[test]
    fn test_unknown_action_fails_decode() {
        let raw = serde_json::json!({
            "source": "meetcap-web-app",
            "action": "reticulateSplines"
        });
        assert!(serde_json::from_value::<Envelope>(raw).is_err());
    }

    #[test]
    fn test_pairing_table_covers_every_request() {
        let requests = [
            "testConnection",
            "startRecording",
            "stopRecording",
            "getRecordingStatus",
            "getRecordingData",
            "clearRecordingData",
        ];
        for request in requests {
            assert!(
                ACTION_PAIRINGS.iter().any(|(out, _)| *out == request),
                "no pairing for {request}"
            );
        }
    }
}
