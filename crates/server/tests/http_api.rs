//! Control plane endpoint tests
//!
//! The engine is wired against the in-memory fragment index and the hash
//! embedder so no vector store or hosted provider is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use aidy_config::Settings;
use aidy_llm::backend::BackendConfig;
use aidy_llm::CerebrasBackend;
use aidy_rag::{
    AnswerSynthesizer, ChunkConfig, EmbeddingConfig, EngineConfig, HashEmbedder, MemoryIndex,
    MetadataStore, RagEngine, SemanticChunker,
};
use aidy_server::{create_router, AppState};

async fn test_state(dir: &std::path::Path) -> AppState {
    let mut config = Settings::default();
    config.paths.uploads_dir = dir.join("uploads").display().to_string();
    config.paths.prompt_file = dir.join("prompt/prompt.md").display().to_string();
    config.paths.log_dir = dir.join("logs").display().to_string();
    config.paths.metadata_file = dir.join("rag_metadata/docs.json").display().to_string();

    let embedder = Arc::new(HashEmbedder::new(EmbeddingConfig {
        embedding_dim: 64,
        ..Default::default()
    }));
    let index = Arc::new(MemoryIndex::new());
    let metadata = MetadataStore::open(&config.paths.metadata_file).unwrap();
    let backend = CerebrasBackend::new(BackendConfig::new("test-key")).unwrap();
    let synthesizer = AnswerSynthesizer::new(Arc::new(backend));
    let chunker = SemanticChunker::new(ChunkConfig::default());

    let engine = RagEngine::new(
        EngineConfig::default(),
        embedder,
        index,
        metadata,
        synthesizer,
        chunker,
    );

    AppState::new(config, Arc::new(engine))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/api/documents")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(preflight).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn health_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn root_reports_service() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn prompt_defaults_then_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let response = create_router(state.clone())
        .oneshot(Request::get("/api/prompt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["prompt"], "You are a helpful voice assistant.");

    let update = Request::put("/api/prompt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"prompt":"You are Aidy."}"#))
        .unwrap();
    let response = create_router(state.clone()).oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "updated");
    assert_eq!(json["length"], 13);

    let response = create_router(state)
        .oneshot(Request::get("/api/prompt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["prompt"], "You are Aidy.");
}

#[tokio::test]
async fn documents_empty_initially() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let response = app
        .oneshot(Request::get("/api/documents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["documents"], serde_json::json!([]));
}

#[tokio::test]
async fn delete_unknown_document_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let response = app
        .oneshot(
            Request::delete("/api/documents/nope1234")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["detail"], "Document not found");
}

#[tokio::test]
async fn upload_rejects_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let boundary = "test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"report.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\nnot a text file\r\n--{b}--\r\n",
        b = boundary
    );

    let request = Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("Unsupported file type"));
}

#[tokio::test]
async fn upload_list_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let boundary = "test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nRefunds are accepted within thirty days.\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let doc_id = json["id"].as_str().unwrap().to_string();
    assert_eq!(json["filename"], "notes.txt");
    assert_eq!(json["status"], "indexed");

    let response = create_router(state.clone())
        .oneshot(Request::get("/api/documents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    let documents = json["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["id"], doc_id.as_str());
    assert_eq!(documents[0]["filename"], "notes.txt");

    let response = create_router(state.clone())
        .oneshot(
            Request::delete(format!("/api/documents/{}", doc_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_router(state)
        .oneshot(Request::get("/api/documents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["documents"], serde_json::json!([]));
}

#[tokio::test]
async fn agent_status_initially_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let response = app
        .oneshot(
            Request::get("/api/agent/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["running"], false);
    assert_eq!(json["pid"], serde_json::Value::Null);
}

#[tokio::test]
async fn stop_agent_without_start_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let response = app
        .oneshot(
            Request::post("/api/agent/stop")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transcripts_list_and_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let log_dir = dir.path().join("logs");
    std::fs::create_dir_all(&log_dir).unwrap();
    std::fs::write(
        log_dir.join("conversation_20260830_120000.txt"),
        "USER: hello\n",
    )
    .unwrap();
    std::fs::write(log_dir.join("unrelated.log"), "noise").unwrap();

    let response = create_router(state.clone())
        .oneshot(
            Request::get("/api/transcripts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let transcripts = json["transcripts"].as_array().unwrap();
    assert_eq!(transcripts.len(), 1);
    assert_eq!(
        transcripts[0]["filename"],
        "conversation_20260830_120000.txt"
    );

    let response = create_router(state)
        .oneshot(
            Request::get("/api/transcripts/conversation_20260830_120000.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["content"], "USER: hello\n");
}

#[tokio::test]
async fn transcript_fetch_missing_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await);

    let response = app
        .oneshot(
            Request::get("/api/transcripts/conversation_20200101_000000.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
