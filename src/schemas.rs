//! Request/response wire types for the analysis API.

use serde::{Deserialize, Serialize};

use crate::sandbox::{Artifact, ArtifactKind};

/// One entry in a query response: a log line block or an artifact.
/// Closed set, serialized as `{"type": ..., "content": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum ResultEntry {
    #[serde(rename = "stdout")]
    Stdout(String),
    #[serde(rename = "stderr")]
    Stderr(String),
    #[serde(rename = "image/png")]
    ImagePng(String),
    #[serde(rename = "image/jpeg")]
    ImageJpeg(String),
    #[serde(rename = "text/plain")]
    TextPlain(String),
}

impl From<Artifact> for ResultEntry {
    fn from(artifact: Artifact) -> Self {
        match artifact.kind {
            ArtifactKind::ImagePng => ResultEntry::ImagePng(artifact.content),
            ArtifactKind::ImageJpeg => ResultEntry::ImageJpeg(artifact.content),
            ArtifactKind::TextPlain => ResultEntry::TextPlain(artifact.content),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub code: String,
    pub results: Vec<ResultEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub filename: String,
    pub columns: String,
    pub message: String,
}

/// Error body, `{"detail": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_entry_serializes_as_type_content() {
        let entry = ResultEntry::Stdout("42".into());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"type": "stdout", "content": "42"}));

        let entry = ResultEntry::ImagePng("AAA".into());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"type": "image/png", "content": "AAA"}));
    }

    #[test]
    fn chat_response_omits_null_error() {
        let resp = ChatResponse {
            answer: "Analysis complete.".into(),
            code: "print(1)".into(),
            results: vec![],
            error: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("error").is_none());
    }
}
