//! Ollama backend client.
//!
//! Sends a chat request to an Ollama-compatible `/api/chat` endpoint and
//! exposes the response body as a channel of raw byte chunks for the
//! [`crate::assembler::StreamAssembler`] to consume. A non-success status
//! before streaming begins is a request-level failure — the assembler never
//! starts and no partial message exists.

use bytes::Bytes;
use futures::StreamExt;
use hearth_core::error::ProviderError;
use hearth_core::message::Role;
use serde::Serialize;
use tracing::{debug, warn};

/// A single message in the outbound prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One turn's outbound request.
#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Client for an Ollama-compatible model backend.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new provider. The timeout covers the whole response; its
    /// enforcement lives here in the HTTP layer, not in the assembler.
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn build_body(request: &ChatTurnRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    /// Send a streaming chat request.
    ///
    /// On success, a spawned task forwards the raw response body over the
    /// returned channel; transport failures mid-stream surface as
    /// [`ProviderError::StreamInterrupted`] items.
    pub async fn chat_stream(
        &self,
        request: ChatTurnRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<Bytes, ProviderError>>, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = Self::build_body(&request);

        debug!(model = %request.model, messages = request.messages.len(), "Sending streaming chat request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error before streaming");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        if tx.send(Ok(bytes)).await.is_err() {
                            return; // receiver dropped — reader abandoned the turn
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    /// List model names known to the backend (GET `/api/tags`).
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let models = body["models"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["name"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    /// Health check — can we reach the backend?
    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let provider = OllamaProvider::new(
            "http://localhost:11434/",
            std::time::Duration::from_secs(30),
        );
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn request_body_shape() {
        let request = ChatTurnRequest {
            model: "mistral".into(),
            messages: vec![
                PromptMessage::system("You are a companion."),
                PromptMessage::user("Hello"),
            ],
            temperature: 0.7,
            max_tokens: 8192,
        };
        let body = OllamaProvider::build_body(&request);

        assert_eq!(body["model"], "mistral");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert_eq!(body["max_tokens"], 8192);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_request_level_failure() {
        // Nothing listens on this port; the failure must surface before any
        // streaming state exists.
        let provider =
            OllamaProvider::new("http://127.0.0.1:9", std::time::Duration::from_secs(1));
        let request = ChatTurnRequest {
            model: "mistral".into(),
            messages: vec![PromptMessage::user("hi")],
            temperature: 0.7,
            max_tokens: 64,
        };
        let result = provider.chat_stream(request).await;
        assert!(matches!(
            result,
            Err(ProviderError::Network(_)) | Err(ProviderError::Timeout(_))
        ));
    }
}
