//! Reqwest-based LLM client for OpenAI-compatible Chat Completions.
//!
//! Single-shot, non-streaming: the analysis pipeline needs the whole
//! completion before code extraction, so there is nothing to stream.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LlmClient {
    /// Builds the client from config. A missing `OPENROUTER_API_KEY` is not
    /// an error here: the absence is recorded and reported on the first
    /// completion call, so construction at startup always succeeds.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let timeout = cfg.get_u64("REQUEST_TIMEOUT").unwrap_or(60);
        let base_url = normalize_base_url(
            &cfg.get("API_BASE_URL")
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
        );
        let api_key = cfg.get("OPENROUTER_API_KEY");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| Error::GenerationRequest(e.to_string()))?;

        Ok(Self { http, base_url, api_key })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Issues one chat-completion request and returns the assistant text.
    pub async fn complete(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(Error::GenerationUnavailable)?;
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::GenerationRequest(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::GenerationRequest(format!("LLM error: {status} - {text}")));
        }

        let completion: Completion = resp
            .json()
            .await
            .map_err(|e| Error::GenerationRequest(format!("malformed response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .ok_or_else(|| Error::GenerationRequest("response contained no choices".into()))
    }
}

/// Appends `/v1` unless the URL already carries a `v1` path segment.
/// Segment-wise comparison, so names that merely contain "v1" don't count.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.split('/').any(|segment| segment == "v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

// Minimal response structures for OpenAI-like completions
#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_v1_appended() {
        assert_eq!(
            normalize_base_url("https://api.openai.com"),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.openai.com/"),
            "https://api.openai.com/v1"
        );
    }

    #[test]
    fn existing_v1_segment_is_kept() {
        assert_eq!(
            normalize_base_url("https://openrouter.ai/api/v1"),
            "https://openrouter.ai/api/v1"
        );
        assert_eq!(
            normalize_base_url("https://proxy.example.com/v1/tenant"),
            "https://proxy.example.com/v1/tenant"
        );
    }

    #[test]
    fn lookalike_segments_do_not_count_as_v1() {
        assert_eq!(
            normalize_base_url("https://host/view1/api"),
            "https://host/view1/api/v1"
        );
        assert_eq!(
            normalize_base_url("https://v1.example.com"),
            "https://v1.example.com/v1"
        );
    }
}
