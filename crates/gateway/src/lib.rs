//! # Hearth Gateway
//!
//! The HTTP surface of the companion: chat turns, message history CRUD,
//! long-term memory management, and speech playback, served by axum over a
//! shared [`AppState`].

pub mod api;
pub mod session;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use hearth_config::AppConfig;
use hearth_context::KnowledgeBase;
use hearth_core::error::Error;
use hearth_core::store::{MemoryStore, MessageStore};
use hearth_providers::OllamaProvider;
use hearth_speech::{NoopEngine, PlaybackSequencer};
use hearth_storage::{InMemoryMemoryStore, InMemoryMessageStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use session::ChatSession;

/// Shared state behind every handler.
pub struct AppState {
    pub config: AppConfig,
    pub session: ChatSession,
    pub messages: Arc<dyn MessageStore>,
    pub memories: Arc<dyn MemoryStore>,
    pub speech: PlaybackSequencer,
}

impl AppState {
    /// Wire up the default single-process topology: in-memory stores, the
    /// configured Ollama backend, and a muted speech engine.
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let messages: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
        let memories: Arc<dyn MemoryStore> = Arc::new(InMemoryMemoryStore::new());

        let kb = KnowledgeBase::load(config.knowledge_base_path.as_deref())
            .map_err(|e| Error::Config {
                message: e.to_string(),
            })?;

        let provider = OllamaProvider::new(
            &config.provider.base_url,
            std::time::Duration::from_millis(config.response_timeout_ms),
        );

        let session = ChatSession::new(
            config.clone(),
            kb,
            provider,
            messages.clone(),
            memories.clone(),
        );

        let speech = PlaybackSequencer::new(Arc::new(NoopEngine), config.max_sentences);

        Ok(Self {
            config,
            session,
            messages,
            memories,
            speech,
        })
    }
}

/// Build the router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/chat", post(api::chat))
        .route(
            "/api/messages",
            get(api::list_messages)
                .post(api::create_message)
                .delete(api::delete_message)
                .put(api::clear_messages),
        )
        .route("/api/messages/{id}", axum::routing::patch(api::update_message))
        .route(
            "/api/memory",
            get(api::list_memories)
                .post(api::create_memory)
                .put(api::reset_memories),
        )
        .route("/api/speech", post(api::speak))
        .route("/api/speech/stop", post(api::stop_speaking))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start(config: AppConfig) -> Result<(), Error> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(AppState::new(config)?);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "Gateway listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| Error::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let mut config = AppConfig::default();
        // Nothing listens here; chat turns that reach the backend fail fast.
        config.provider.base_url = "http://127.0.0.1:9".into();
        config.response_timeout_ms = 1_000;
        Arc::new(AppState::new(config).unwrap())
    }

    fn app() -> Router {
        build_router(test_state())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn message_crud_cycle() {
        let state = test_state();

        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/messages",
                serde_json::json!({ "content": "hello there" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["role"], "user");

        let response = build_router(state.clone())
            .oneshot(Request::get("/api/messages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let response = build_router(state.clone())
            .oneshot(json_request(
                "PATCH",
                &format!("/api/messages/{id}"),
                serde_json::json!({ "content": "edited" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["content"], "edited");

        let response = build_router(state.clone())
            .oneshot(json_request(
                "DELETE",
                "/api/messages",
                serde_json::json!({ "id": id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = build_router(state)
            .oneshot(Request::get("/api/messages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_message_is_404() {
        let response = app()
            .oneshot(json_request(
                "DELETE",
                "/api/messages",
                serde_json::json!({ "id": "missing" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_message_content_rejected() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/messages",
                serde_json::json!({ "content": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clear_messages_empties_history() {
        let state = test_state();
        build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/messages",
                serde_json::json!({ "content": "to be cleared" }),
            ))
            .await
            .unwrap();

        let response = build_router(state.clone())
            .oneshot(Request::put("/api/messages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Clearing responds with the now-empty list.
        assert!(body_json(response).await.as_array().unwrap().is_empty());

        let response = build_router(state)
            .oneshot(Request::get("/api/messages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_create_validates_fields() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/memory",
                serde_json::json!({
                    "kind": "", "category": "core", "content": "x", "importance": 3
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn memory_reset_installs_persona_seeds() {
        let state = test_state();
        let response = build_router(state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/memory",
                serde_json::json!({ "action": "reset" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["seeded"], 2);

        let response = build_router(state)
            .oneshot(Request::get("/api/memory").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        let contents: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["content"].as_str().unwrap())
            .collect();
        assert!(contents.contains(&"name:Scarlett"));
    }

    #[tokio::test]
    async fn memory_reset_rejects_unknown_action() {
        let state = test_state();
        build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/memory",
                serde_json::json!({
                    "kind": "event", "category": "chat", "content": "precious", "importance": 4
                }),
            ))
            .await
            .unwrap();

        let response = build_router(state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/memory",
                serde_json::json!({ "action": "bogus" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The rejected action must leave the store untouched.
        let response = build_router(state)
            .oneshot(Request::get("/api/memory").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert!(
            listed
                .as_array()
                .unwrap()
                .iter()
                .any(|r| r["content"] == "precious")
        );
    }

    #[tokio::test]
    async fn chat_with_empty_message_rejected() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                serde_json::json!({ "message": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_knowledge_shortcut_streams_plain_text() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                serde_json::json!({ "message": "how did van gogh die?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("1890"));
    }

    #[tokio::test]
    async fn second_chat_rejected_while_turn_in_flight() {
        // A backend that accepts connections and reads the request but
        // never responds keeps the first turn streaming-pending, holding
        // the guard.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
                });
            }
        });

        let mut config = AppConfig::default();
        config.provider.base_url = format!("http://{addr}");
        config.response_timeout_ms = 10_000;
        let state = Arc::new(AppState::new(config).unwrap());

        let first = {
            let router = build_router(state.clone());
            tokio::spawn(async move {
                router
                    .oneshot(json_request(
                        "POST",
                        "/api/chat",
                        serde_json::json!({ "message": "first turn" }),
                    ))
                    .await
            })
        };

        // Let the first turn take the guard and block on the backend.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let response = build_router(state)
            .oneshot(json_request(
                "POST",
                "/api/chat",
                serde_json::json!({ "message": "second turn" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        first.abort();
    }

    #[tokio::test]
    async fn chat_backend_failure_is_bad_gateway() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                serde_json::json!({ "message": "tell me a story" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn speech_endpoints_respond() {
        let state = test_state();
        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/speech",
                serde_json::json!({ "text": "Hello. World." }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["played"], 2);

        let response = build_router(state)
            .oneshot(
                Request::post("/api/speech/stop")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
