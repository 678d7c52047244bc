//! Router-level tests: wiring, fault mapping, and the no-network paths.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::util::ServiceExt;

use datalens::agent::AgentClient;
use datalens::config::Config;
use datalens::sandbox::SandboxClient;
use datalens::server::{build_router, AppState};
use datalens::session::{SessionRegistry, DATASET_FILENAME};

fn test_config() -> Config {
    // No credentials: the agent builds but generation is unavailable, and
    // no test below ever reaches a real provider.
    Config::from_map(HashMap::new())
}

fn test_app(registry: SessionRegistry) -> Router {
    let cfg = test_config();
    let agent = AgentClient::from_config(&cfg).unwrap();
    build_router(AppState::new(cfg, agent, registry), "*")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app(SessionRegistry::new());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn root_reports_service_info() {
    let app = test_app(SessionRegistry::new());
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "online");
    assert_eq!(json["service"], "DataLens Backend");
}

#[tokio::test]
async fn chat_for_unknown_session_is_not_found() {
    let app = test_app(SessionRegistry::new());
    let response = app
        .oneshot(
            Request::post("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"session_id": "no-such-session", "query": "average of a?"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("Session not found"));
}

#[tokio::test]
async fn chat_without_llm_credential_is_a_server_fault() {
    let registry = SessionRegistry::new();
    registry
        .create_or_get("s1", DATASET_FILENAME, "a,b,c", || async {
            Ok(SandboxClient::new("http://127.0.0.1:9", "test-key", 1, 1).unwrap())
        })
        .await
        .unwrap();

    let app = test_app(registry);
    let response = app
        .oneshot(
            Request::post("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"session_id": "s1", "query": "what is a?"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("not initialized"));
}

#[tokio::test]
async fn remove_session_then_chat_is_not_found() {
    let registry = SessionRegistry::new();
    registry
        .create_or_get("s1", DATASET_FILENAME, "a,b", || async {
            Ok(SandboxClient::new("http://127.0.0.1:9", "test-key", 1, 1).unwrap())
        })
        .await
        .unwrap();

    let app = test_app(registry);

    let response = app
        .clone()
        .oneshot(
            Request::delete("/api/session/s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Removing an unknown session is still a 200 no-op.
    let response = app
        .clone()
        .oneshot(
            Request::delete("/api/session/s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::post("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"session_id": "s1", "query": "anything"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let app = test_app(SessionRegistry::new());

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
    );
    let response = app
        .oneshot(
            Request::post("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("file"));
}
