//! Long-running operation domain types
//!
//! Video generation is asynchronous on the server: submission returns an
//! operation handle, and the handle is re-fetched until it reports `done`.

use serde::{Deserialize, Serialize};

use crate::dto::video::GenerateVideoResponse;

/// A refreshable reference to a server-side asynchronous job
///
/// Each status query yields a complete replacement handle; implementors are
/// never merged with a previous snapshot.
pub trait JobHandle {
    /// Server-assigned identity of the job
    fn id(&self) -> &str;

    /// Whether the job has reached a terminal state
    fn is_done(&self) -> bool;

    /// Locator of the finished artifact, when the job produced one
    fn result_locator(&self) -> Option<&str>;

    /// Error reported by the server for a finished job, if any
    fn failure_message(&self) -> Option<String> {
        None
    }
}

/// Video generation operation as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOperation {
    /// Resource name, e.g. `models/veo/operations/abc123`
    pub name: String,
    /// Absent on freshly submitted operations
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<OperationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationStatus>,
}

/// Payload of a finished video operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

/// Error status attached to a failed operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl VideoOperation {
    /// URI of the first generated video sample
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

impl JobHandle for VideoOperation {
    fn id(&self) -> &str {
        &self.name
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn result_locator(&self) -> Option<&str> {
        self.video_uri()
    }

    fn failure_message(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|status| format!("{} (code {})", status.message, status.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_operation_deserializes_without_done() {
        let op: VideoOperation =
            serde_json::from_value(json!({ "name": "models/veo/operations/op1" })).unwrap();

        assert_eq!(op.id(), "models/veo/operations/op1");
        assert!(!op.is_done());
        assert_eq!(op.result_locator(), None);
    }

    #[test]
    fn test_completed_operation_exposes_video_uri() {
        let op: VideoOperation = serde_json::from_value(json!({
            "name": "models/veo/operations/op1",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [
                        { "video": { "uri": "https://files.example/v1/files/abc:download?alt=media" } }
                    ]
                }
            }
        }))
        .unwrap();

        assert!(op.is_done());
        assert_eq!(
            op.result_locator(),
            Some("https://files.example/v1/files/abc:download?alt=media")
        );
        assert_eq!(op.failure_message(), None);
    }

    #[test]
    fn test_completed_operation_with_error() {
        let op: VideoOperation = serde_json::from_value(json!({
            "name": "op2",
            "done": true,
            "error": { "code": 3, "message": "prompt rejected" }
        }))
        .unwrap();

        assert!(op.is_done());
        assert_eq!(op.result_locator(), None);
        assert_eq!(op.failure_message().as_deref(), Some("prompt rejected (code 3)"));
    }

    #[test]
    fn test_empty_uri_is_not_a_locator() {
        let op: VideoOperation = serde_json::from_value(json!({
            "name": "op3",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [ { "video": { "uri": "" } } ] } }
        }))
        .unwrap();

        assert_eq!(op.result_locator(), None);
    }
}
