//! HTTP handlers.
//!
//! Thin translation layer: handlers validate the wire shape, delegate to the
//! session, stores, or sequencer, and map domain errors to status codes.
//! The chat endpoint streams plain-text fragments; everything else is JSON.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use hearth_core::error::{Error, StorageError};
use hearth_core::message::ChatMessage;
use hearth_core::store::MemoryRecord;
use hearth_storage::base_memories;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::AppState;
use crate::session::TurnReply;

/// Domain error → HTTP response.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Busy => StatusCode::CONFLICT,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
            Error::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Storage(StorageError::Invalid(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "hearth-gateway" }))
}

// --- Chat ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/chat — run one turn, streaming the response as plain text.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    if req.message.trim().is_empty() {
        return Err(StorageError::Invalid("message must not be empty".into()).into());
    }

    let reply = state.session.submit(req.message).await?;

    let body = match reply {
        TurnReply::Direct(answer) => Body::from(answer),
        TurnReply::Streamed(rx) => Body::from_stream(ReceiverStream::new(rx)),
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body)
        .map_err(|e| Error::Internal(e.to_string()))?)
}

// --- Messages ---

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
    #[serde(default)]
    pub role: Option<hearth_core::message::Role>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMessageRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: String,
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    Ok(Json(state.messages.list().await?))
}

pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    if req.content.trim().is_empty() {
        return Err(StorageError::Invalid("content must not be empty".into()).into());
    }
    let message = match req.role {
        Some(hearth_core::message::Role::Assistant) => ChatMessage::assistant(req.content),
        _ => ChatMessage::user(req.content),
    };
    let created = state.messages.create(message).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/messages with `{id}` — soft delete one message.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.messages.soft_delete(&req.id).await?;
    Ok(Json(json!({ "deleted": req.id })))
}

/// PUT /api/messages — permanently clear the whole history. Returns the
/// now-empty message list.
pub async fn clear_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    state.messages.hard_delete_all().await?;
    Ok(Json(Vec::new()))
}

/// PATCH /api/messages/{id} — replace a message's content.
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<Json<ChatMessage>, ApiError> {
    if req.content.trim().is_empty() {
        return Err(StorageError::Invalid("content must not be empty".into()).into());
    }
    Ok(Json(state.messages.update(&id, &req.content).await?))
}

// --- Memory ---

#[derive(Debug, Deserialize)]
pub struct MemoryQuery {
    #[serde(default = "default_memory_limit")]
    pub limit: usize,
}

fn default_memory_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct CreateMemoryRequest {
    pub kind: String,
    pub category: String,
    pub content: String,
    pub importance: u8,
}

pub async fn list_memories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MemoryQuery>,
) -> Result<Json<Vec<MemoryRecord>>, ApiError> {
    Ok(Json(state.memories.top_by_importance(query.limit).await?))
}

pub async fn create_memory(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMemoryRequest>,
) -> Result<(StatusCode, Json<MemoryRecord>), ApiError> {
    if req.kind.trim().is_empty() || req.category.trim().is_empty() || req.content.trim().is_empty()
    {
        return Err(
            StorageError::Invalid("kind, category, and content are required".into()).into(),
        );
    }
    let record = MemoryRecord::new(req.kind, req.category, req.content, req.importance);
    let created = state.memories.create(record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct MemoryActionRequest {
    pub action: String,
}

/// PUT /api/memory with `{action:"reset"}` — reset to the base persona
/// memories. Any other action is rejected.
pub async fn reset_memories(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemoryActionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.action != "reset" {
        return Err(StorageError::Invalid(format!("unknown action: {}", req.action)).into());
    }
    let seeds = base_memories(&state.config.persona_name);
    let seeded = seeds.len();
    state.memories.reset_and_seed(seeds).await?;
    Ok(Json(json!({ "reset": true, "seeded": seeded })))
}

// --- Speech ---

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

pub async fn speak(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let played = state.speech.speak(&req.text).await;
    Ok(Json(json!({ "played": played })))
}

pub async fn stop_speaking(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.speech.stop().await;
    Ok(Json(json!({ "stopped": true })))
}
