//! HTTP endpoints
//!
//! REST surface of the control plane: document upload and knowledge base
//! management, persona prompt editing, worker lifecycle, transcripts.

use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Json, Multipart, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use aidy_config::constants::prompts;
use aidy_rag::reader;

use crate::agent_process::AgentStatus;
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Knowledge base
        .route("/api/upload", post(upload_document))
        .route("/api/documents", get(list_documents))
        .route("/api/documents/:doc_id", delete(delete_document))
        // Persona prompt
        .route("/api/prompt", get(get_prompt))
        .route("/api/prompt", put(update_prompt))
        // Worker lifecycle
        .route("/api/agent/status", get(agent_status))
        .route("/api/agent/start", post(start_agent))
        .route("/api/agent/stop", post(stop_agent))
        // Transcripts
        .route("/api/transcripts", get(list_transcripts))
        .route("/api/transcripts/:filename", get(get_transcript))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any);
    }

    // Credentialed CORS forbids wildcard headers; list what the frontend sends
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "Aidy Voice Orchestration API" }))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Upload a document and index it
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ServerError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(String::from)
                .ok_or_else(|| ServerError::BadRequest("Missing filename".to_string()))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read upload: {}", e)))?;
            upload = Some((filename, data.to_vec()));
            break;
        }
    }

    let Some((filename, data)) = upload else {
        return Err(ServerError::BadRequest("Missing 'file' field".to_string()));
    };

    if !reader::is_supported(&filename) {
        return Err(ServerError::BadRequest(format!(
            "Unsupported file type: {}. Allowed: {}",
            filename,
            reader::SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    let uploads_dir = PathBuf::from(&state.config.paths.uploads_dir);
    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .map_err(|e| ServerError::Internal(format!("Failed to create uploads dir: {}", e)))?;

    let file_id = Uuid::new_v4().simple().to_string()[..8].to_string();
    let file_path = uploads_dir.join(format!("{}_{}", file_id, filename));

    let size = data.len();
    tokio::fs::write(&file_path, data)
        .await
        .map_err(|e| ServerError::Internal(format!("Failed to save upload: {}", e)))?;

    tracing::info!(path = %file_path.display(), size, "File saved");

    match state.engine.add_document(&file_path, &filename).await {
        Ok(doc_id) => Ok(Json(json!({
            "id": doc_id,
            "filename": filename,
            "size": size,
            "status": "indexed",
        }))),
        Err(e) => {
            let _ = tokio::fs::remove_file(&file_path).await;
            tracing::error!(error = %e, "Upload failed");
            Err(ServerError::Internal(format!("Upload failed: {}", e)))
        },
    }
}

/// List indexed documents
async fn list_documents(State(state): State<AppState>) -> Json<Value> {
    let docs = state.engine.list_documents();
    Json(json!({ "documents": docs }))
}

/// Delete a document from the knowledge base
async fn delete_document(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let deleted = state.engine.delete_document(&doc_id).await?;

    if !deleted {
        return Err(ServerError::NotFound("Document not found".to_string()));
    }

    Ok(Json(json!({ "status": "deleted", "id": doc_id })))
}

/// Read the persona prompt
async fn get_prompt(State(state): State<AppState>) -> Json<Value> {
    let prompt = tokio::fs::read_to_string(&state.config.paths.prompt_file)
        .await
        .unwrap_or_else(|_| prompts::DEFAULT_PERSONA.to_string());

    Json(json!({ "prompt": prompt }))
}

#[derive(Debug, Deserialize)]
struct PromptUpdate {
    prompt: String,
}

/// Overwrite the persona prompt
async fn update_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptUpdate>,
) -> Result<Json<Value>, ServerError> {
    let path = PathBuf::from(&state.config.paths.prompt_file);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to create prompt dir: {}", e)))?;
    }

    tokio::fs::write(&path, &request.prompt)
        .await
        .map_err(|e| ServerError::Internal(format!("Failed to write prompt: {}", e)))?;

    tracing::info!(chars = request.prompt.len(), "System prompt updated");
    Ok(Json(json!({ "status": "updated", "length": request.prompt.len() })))
}

async fn agent_status(State(state): State<AppState>) -> Json<AgentStatus> {
    Json(state.agent.status().await)
}

#[derive(Debug, Deserialize)]
struct StartAgentRequest {
    #[serde(default = "default_mode")]
    mode: String,
}

fn default_mode() -> String {
    "dev".to_string()
}

async fn start_agent(
    State(state): State<AppState>,
    Json(request): Json<StartAgentRequest>,
) -> Result<Json<AgentStatus>, ServerError> {
    let status = state.agent.start(&request.mode).await?;
    Ok(Json(status))
}

async fn stop_agent(State(state): State<AppState>) -> Result<Json<Value>, ServerError> {
    state.agent.stop().await?;
    Ok(Json(json!({ "status": "stopped" })))
}

/// List the ten most recent transcript files
async fn list_transcripts(State(state): State<AppState>) -> Json<Value> {
    let log_dir = PathBuf::from(&state.config.paths.log_dir);

    let mut transcripts: Vec<Value> = Vec::new();
    if let Ok(entries) = std::fs::read_dir(&log_dir) {
        let mut files: Vec<(String, std::fs::Metadata)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with("conversation_") && name.ends_with(".txt") {
                    entry.metadata().ok().map(|meta| (name, meta))
                } else {
                    None
                }
            })
            .collect();

        // Timestamped names sort newest-first in reverse lexicographic order
        files.sort_by(|a, b| b.0.cmp(&a.0));

        transcripts = files
            .into_iter()
            .take(10)
            .map(|(name, meta)| {
                let created = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                json!({ "filename": name, "created": created, "size": meta.len() })
            })
            .collect();
    }

    Json(json!({ "transcripts": transcripts }))
}

/// Read one transcript file
async fn get_transcript(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if !is_safe_transcript_name(&filename) {
        return Err(ServerError::BadRequest("Invalid filename".to_string()));
    }

    let path = FsPath::new(&state.config.paths.log_dir).join(&filename);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| ServerError::NotFound("Transcript not found".to_string()))?;

    Ok(Json(json!({ "filename": filename, "content": content })))
}

/// Reject path traversal in transcript names
fn is_safe_transcript_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_name_traversal_rejected() {
        assert!(is_safe_transcript_name("conversation_20260830_120000.txt"));
        assert!(!is_safe_transcript_name("../secrets.txt"));
        assert!(!is_safe_transcript_name("logs/../../etc/passwd"));
        assert!(!is_safe_transcript_name(""));
    }

    #[test]
    fn test_cors_layer_with_invalid_origins_falls_back() {
        // Should not panic on unparseable origins
        let _ = build_cors_layer(&["http://localhost:5173\u{0}".to_string()], true);
        let _ = build_cors_layer(&[], true);
        let _ = build_cors_layer(&[], false);
    }
}
