//! Remote execution environment client.
//!
//! One `SandboxClient` represents one isolated, stateful remote context,
//! owned by exactly one session. The provider exposes context lifecycle
//! (create/destroy), a file-write call, and a run call returning logs plus
//! typed rich results and an optional runtime error object.
//!
//! Failures inside executed code are expected (arbitrary generated code
//! against arbitrary data) and are returned as data in [`ExecutionOutcome`],
//! never as `Err`. Only transport and provisioning failures raise, because
//! those mean the pipeline itself is broken.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

/// Recognized artifact types. Anything else the provider emits is dropped
/// during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    #[serde(rename = "image/png")]
    ImagePng,
    #[serde(rename = "image/jpeg")]
    ImageJpeg,
    #[serde(rename = "text/plain")]
    TextPlain,
}

/// One rich result emitted by the remote context, in emission order.
/// Image payloads are base64 as delivered by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Normalized result of one code execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub artifacts: Vec<Artifact>,
    pub execution_time: f64,
    pub error: Option<String>,
}

// Provider wire shapes for the run call.

#[derive(Debug, Default, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub results: Vec<RichResult>,
    #[serde(default)]
    pub logs: RunLogs,
    #[serde(default)]
    pub error: Option<RunError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunLogs {
    #[serde(default)]
    pub stdout: Vec<String>,
    #[serde(default)]
    pub stderr: Vec<String>,
}

/// A rich result carries at most one recognized payload field. Every other
/// field (html, chart specs, provider flags) lands in `metadata`; a result
/// with no recognized payload is dropped during normalization.
#[derive(Debug, Default, Deserialize)]
pub struct RichResult {
    #[serde(default)]
    pub png: Option<String>,
    #[serde(default)]
    pub jpeg: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RunError {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub traceback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "sandboxId")]
    sandbox_id: String,
}

pub struct SandboxClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    exec_timeout: Duration,
    // Provider-assigned context id: None before start(), cleared by stop().
    sandbox_id: Mutex<Option<String>>,
}

impl SandboxClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_key = cfg.get("E2B_API_KEY").ok_or_else(|| {
            Error::Provisioning("E2B_API_KEY not found in environment or config".into())
        })?;
        let base = cfg
            .get("SANDBOX_API_BASE")
            .unwrap_or_else(|| "https://api.e2b.dev".to_string());
        let timeout = cfg.get_u64("REQUEST_TIMEOUT").unwrap_or(60);
        let exec_timeout = cfg.get_u64("EXECUTION_TIMEOUT").unwrap_or(300);
        Self::new(base, api_key, timeout, exec_timeout)
    }

    pub fn new(
        base: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
        exec_timeout_secs: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Provisioning(e.to_string()))?;

        Ok(Self {
            http,
            base: base.into(),
            api_key: api_key.into(),
            exec_timeout: Duration::from_secs(exec_timeout_secs),
            sandbox_id: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.trim_end_matches('/'), path)
    }

    fn current_id(&self) -> Result<String> {
        self.sandbox_id
            .lock()
            .expect("sandbox id lock poisoned")
            .clone()
            .ok_or(Error::NotStarted)
    }

    /// Provisions a new remote context and binds it to this client.
    pub async fn start(&self) -> Result<String> {
        tracing::info!("starting sandbox");
        let resp = self
            .http
            .post(self.url("/v1/sandboxes"))
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::Provisioning(format!("provider unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provisioning(format!(
                "sandbox create failed: {status} - {text}"
            )));
        }

        let created: CreateResponse = resp
            .json()
            .await
            .map_err(|e| Error::Provisioning(format!("malformed create response: {e}")))?;

        let mut guard = self.sandbox_id.lock().expect("sandbox id lock poisoned");
        *guard = Some(created.sandbox_id.clone());
        Ok(created.sandbox_id)
    }

    /// Stages raw bytes at a deterministic path inside the context's working
    /// directory. Re-uploading the same name overwrites.
    pub async fn upload_file(&self, name: &str, content: Vec<u8>) -> Result<String> {
        let id = self.current_id()?;
        let remote_path = format!("/home/user/{name}");

        self.http
            .put(self.url(&format!("/v1/sandboxes/{id}/files")))
            .header("X-API-Key", &self.api_key)
            .query(&[("path", remote_path.as_str())])
            .body(content)
            .send()
            .await?
            .error_for_status()?;

        Ok(remote_path)
    }

    /// Runs source code in the remote context and blocks until completion.
    /// A runtime error inside the code yields `Ok` with `success == false`
    /// and whatever output was produced before the failure.
    pub async fn execute(&self, code: &str) -> Result<ExecutionOutcome> {
        let id = self.current_id()?;
        let started = Instant::now();

        let resp = self
            .http
            .post(self.url(&format!("/v1/sandboxes/{id}/code")))
            .header("X-API-Key", &self.api_key)
            .timeout(self.exec_timeout)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?
            .error_for_status()?;

        let run: RunResponse = resp.json().await?;
        Ok(normalize_outcome(run, started.elapsed()))
    }

    /// Terminates the remote context. The local reference is cleared up
    /// front so later calls fail fast with `NotStarted` even if the remote
    /// side refuses the kill.
    pub async fn stop(&self) -> Result<()> {
        let id = {
            let mut guard = self.sandbox_id.lock().expect("sandbox id lock poisoned");
            guard.take()
        };
        let Some(id) = id else {
            return Ok(());
        };

        tracing::info!(sandbox_id = %id, "stopping sandbox");
        let resp = self
            .http
            .delete(self.url(&format!("/v1/sandboxes/{id}")))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        // Already-gone contexts are fine; that is the goal state.
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            resp.error_for_status()?;
        }
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.sandbox_id
            .lock()
            .expect("sandbox id lock poisoned")
            .is_some()
    }
}

/// Maps a raw provider run response into the normalized outcome. Total over
/// the recognized artifact set; html and unknown rich results are dropped.
pub fn normalize_outcome(run: RunResponse, elapsed: Duration) -> ExecutionOutcome {
    let artifacts = normalize_results(run.results);
    let stdout = run.logs.stdout.join("\n");
    let stderr = run.logs.stderr.join("\n");
    let error = run.error.as_ref().map(format_run_error);

    ExecutionOutcome {
        success: error.is_none(),
        stdout,
        stderr,
        artifacts,
        execution_time: elapsed.as_secs_f64(),
        error,
    }
}

fn normalize_results(results: Vec<RichResult>) -> Vec<Artifact> {
    results
        .into_iter()
        .filter_map(|r| {
            let metadata = if r.metadata.is_empty() { None } else { Some(r.metadata) };
            let (kind, content) = if let Some(png) = r.png {
                (ArtifactKind::ImagePng, png)
            } else if let Some(jpeg) = r.jpeg {
                (ArtifactKind::ImageJpeg, jpeg)
            } else if let Some(text) = r.text {
                (ArtifactKind::TextPlain, text)
            } else {
                return None;
            };
            Some(Artifact { kind, content, metadata })
        })
        .collect()
}

fn format_run_error(err: &RunError) -> String {
    match &err.traceback {
        Some(tb) if !tb.is_empty() => format!("{}: {}\n{}", err.name, err.value, tb),
        _ => format!("{}: {}", err.name, err.value),
    }
}
