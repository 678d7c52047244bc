//! Chat flow: query → generated code → sandboxed execution → response.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::error::Error;
use crate::handlers::ApiFault;
use crate::sandbox::ExecutionOutcome;
use crate::schemas::{ChatRequest, ChatResponse, ResultEntry};
use crate::server::AppState;
use crate::session::DATASET_PATH;

pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiFault> {
    let Some(session) = state.registry.get(&req.session_id) else {
        return Err(ApiFault::not_found("Session not found. Upload a file first."));
    };

    tracing::info!(session_id = %req.session_id, "analysis query");

    let agent = Arc::clone(&state.agent);
    let columns = session.columns.clone();
    let query = req.query.clone();
    let executor = Arc::clone(&session);

    let response = run_analysis(
        move || async move { agent.generate_code(&query, DATASET_PATH, &columns).await },
        move |code| async move { executor.sandbox.execute(&code).await },
    )
    .await?;

    Ok(Json(response))
}

/// Core pipeline, separated from the HTTP extractors so generation and
/// execution can be substituted in tests. Generation returning no code
/// short-circuits: the sandbox is never touched.
pub(crate) async fn run_analysis<G, GFut, E, EFut>(
    generate: G,
    execute: E,
) -> Result<ChatResponse, ApiFault>
where
    G: FnOnce() -> GFut,
    GFut: Future<Output = Result<Option<String>, Error>>,
    E: FnOnce(String) -> EFut,
    EFut: Future<Output = Result<ExecutionOutcome, Error>>,
{
    let code = generate()
        .await
        .map_err(|e| ApiFault::server(format!("Agent generation failed: {e}")))?;

    let Some(code) = code else {
        return Ok(ChatResponse {
            answer: "I couldn't generate code for that request.".to_string(),
            code: String::new(),
            results: vec![],
            error: None,
        });
    };

    let outcome = execute(code.clone())
        .await
        .map_err(|e| ApiFault::server(format!("Execution failed: {e}")))?;

    Ok(build_response(code, outcome))
}

/// Maps an execution outcome into the response contract: stdout/stderr as
/// log entries, then artifacts in emission order. A failed run still ships
/// everything captured before the failure.
pub(crate) fn build_response(code: String, outcome: ExecutionOutcome) -> ChatResponse {
    let mut results = Vec::new();
    if !outcome.stdout.is_empty() {
        results.push(ResultEntry::Stdout(outcome.stdout));
    }
    if !outcome.stderr.is_empty() {
        results.push(ResultEntry::Stderr(outcome.stderr));
    }
    results.extend(outcome.artifacts.into_iter().map(ResultEntry::from));

    ChatResponse {
        answer: "Analysis complete.".to_string(),
        code,
        results,
        error: outcome.error,
    }
}
