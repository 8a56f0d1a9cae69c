//! The chat turn pipeline.
//!
//! One [`ChatSession`] per process drives the full turn: admit the request
//! through the turn guard, persist the user message, advance the
//! conversational state, build the prompt, stream the backend response
//! through the assembler, and commit the finalized assistant message. The
//! guard is released on every exit path so a failed turn never wedges the
//! conversation.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use hearth_config::AppConfig;
use hearth_context::{
    ConversationState, KnowledgeBase, extract_topics, knowledge_context, prepare_context_info,
    specific_answer, time_context, update,
};
use hearth_core::error::{Error, ProviderError};
use hearth_core::message::ChatMessage;
use hearth_core::store::{MemoryStore, MessageStore};
use hearth_core::turn::TurnGuard;
use hearth_providers::{ChatTurnRequest, OllamaProvider, PromptMessage, StreamAssembler};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info};

/// How many top memories condition each prompt.
const MEMORY_RECALL_LIMIT: usize = 10;

/// The reply to a chat submission.
pub enum TurnReply {
    /// Answered directly from the knowledge base; no backend involved.
    Direct(String),
    /// Fragments of the streamed backend response, in order.
    Streamed(mpsc::Receiver<Result<Bytes, std::io::Error>>),
}

/// Per-process conversation driver.
pub struct ChatSession {
    config: AppConfig,
    kb: KnowledgeBase,
    provider: OllamaProvider,
    messages: Arc<dyn MessageStore>,
    memories: Arc<dyn MemoryStore>,
    state: Mutex<ConversationState>,
    guard: Arc<Mutex<TurnGuard>>,
}

impl ChatSession {
    pub fn new(
        config: AppConfig,
        kb: KnowledgeBase,
        provider: OllamaProvider,
        messages: Arc<dyn MessageStore>,
        memories: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            config,
            kb,
            provider,
            messages,
            memories,
            state: Mutex::new(ConversationState::new(Utc::now())),
            guard: Arc::new(Mutex::new(TurnGuard::new())),
        }
    }

    /// Run one chat turn.
    ///
    /// Fails fast with [`Error::Busy`] while a previous turn is in flight.
    /// A backend failure before streaming begins persists an inline error
    /// notice and propagates the provider error.
    pub async fn submit(&self, user_text: String) -> Result<TurnReply, Error> {
        self.guard.lock().await.begin()?;

        match self.run_turn(user_text).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                // Failure before the stream started; release here.
                self.guard.lock().await.complete();
                Err(e)
            }
        }
    }

    async fn run_turn(&self, user_text: String) -> Result<TurnReply, Error> {
        let now = Utc::now();

        self.messages
            .create(ChatMessage::user(user_text.clone()))
            .await?;

        let topics = extract_topics(&self.kb, &user_text);
        let state_snapshot = {
            let mut state = self.state.lock().await;
            *state = update(&self.kb, &state, &user_text, now);
            state.clone()
        };

        // Factual questions the knowledge base can answer skip the model.
        if let Some(answer) = specific_answer(&self.kb, &user_text, &topics) {
            info!("Answered directly from knowledge base");
            self.messages
                .create(ChatMessage::assistant(answer.clone()))
                .await?;
            self.guard.lock().await.complete();
            return Ok(TurnReply::Direct(answer));
        }

        let system = self.build_system_prompt(&topics, &state_snapshot).await?;
        let request = ChatTurnRequest {
            model: self.config.model.clone(),
            messages: vec![PromptMessage::system(system), PromptMessage::user(user_text)],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut chunks = match self.provider.chat_stream(request).await {
            Ok(rx) => rx,
            Err(e) => {
                error!(error = %e, "Backend request failed before streaming");
                self.messages
                    .create(ChatMessage::error_notice(
                        "I'm having trouble reaching my language model right now. Please try again in a moment.",
                    ))
                    .await?;
                return Err(e.into());
            }
        };

        let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(64);
        let messages = self.messages.clone();
        let guard = self.guard.clone();

        tokio::spawn(async move {
            let mut assembler = StreamAssembler::new();
            let mut interrupted: Option<ProviderError> = None;

            while let Some(chunk) = chunks.recv().await {
                match chunk {
                    Ok(bytes) => {
                        for fragment in assembler.push_chunk(&bytes) {
                            if tx.send(Ok(Bytes::from(fragment))).await.is_err() {
                                // Client went away; still finalize below.
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        interrupted = Some(e);
                        break;
                    }
                }
            }

            guard.lock().await.finalize();

            debug!(
                malformed = assembler.malformed_lines(),
                done = assembler.is_done(),
                "Stream ended"
            );

            let final_message = assembler.finish();
            let commit = if let Some(e) = interrupted {
                error!(error = %e, "Stream interrupted; persisting partial response");
                if final_message.content.is_empty() {
                    ChatMessage::error_notice(
                        "My response was cut off. Please try again.",
                    )
                } else {
                    final_message
                }
            } else {
                final_message
            };

            if let Err(e) = messages.create(commit).await {
                error!(error = %e, "Failed to persist assistant message");
            }

            guard.lock().await.complete();
        });

        Ok(TurnReply::Streamed(rx))
    }

    /// Compose the system prompt: persona, time of day, recent context,
    /// relevant knowledge, and the top recalled memories.
    async fn build_system_prompt(
        &self,
        topics: &[String],
        state: &ConversationState,
    ) -> Result<String, Error> {
        let now = Utc::now();
        let mut prompt = self.config.system_prompt.clone();

        prompt.push_str(&format!("\n\nCurrent time of day: {}", time_context(now)));
        prompt.push_str(&format!("\n\n{}", prepare_context_info(state, now)));

        let knowledge = knowledge_context(&self.kb, topics);
        if !knowledge.is_empty() {
            prompt.push_str(&format!("\n\nRelevant knowledge: {knowledge}"));
        }

        let recalled = self.memories.top_by_importance(MEMORY_RECALL_LIMIT).await?;
        if !recalled.is_empty() {
            prompt.push_str("\n\nKey memories:");
            for record in &recalled {
                prompt.push_str(&format!("\n- {}", record.content));
            }
        }

        Ok(prompt)
    }

    /// Current turn guard state, for diagnostics.
    pub async fn is_busy(&self) -> bool {
        self.guard.lock().await.state() != hearth_core::turn::TurnState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_storage::{InMemoryMemoryStore, InMemoryMessageStore};

    fn session_with_unreachable_backend() -> ChatSession {
        let config = AppConfig::default();
        // Nothing listens here; chat requests fail at the request level.
        let provider = OllamaProvider::new(
            "http://127.0.0.1:9",
            std::time::Duration::from_secs(1),
        );
        ChatSession::new(
            config,
            KnowledgeBase::builtin(),
            provider,
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(InMemoryMemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn knowledge_question_answered_without_backend() {
        let session = session_with_unreachable_backend();
        let reply = session.submit("how did van gogh die?".into()).await.unwrap();
        match reply {
            TurnReply::Direct(answer) => assert!(answer.contains("1890")),
            TurnReply::Streamed(_) => panic!("expected a direct answer"),
        }
        // Both the question and the answer were persisted.
        let listed = session.messages.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        // And the guard is released.
        assert!(!session.is_busy().await);
    }

    #[tokio::test]
    async fn backend_failure_persists_error_notice_and_releases_guard() {
        let session = session_with_unreachable_backend();
        let result = session.submit("tell me a story".into()).await;
        assert!(matches!(result, Err(Error::Provider(_))));

        let listed = session.messages.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[1].severity.is_some());
        assert!(!session.is_busy().await);
    }

    #[tokio::test]
    async fn prompt_carries_context_and_memories() {
        let session = session_with_unreachable_backend();
        session
            .memories
            .create(hearth_core::store::MemoryRecord::new(
                "personality",
                "core",
                "name:Scarlett",
                5,
            ))
            .await
            .unwrap();

        let now = Utc::now();
        let state = {
            let state = ConversationState::new(now);
            update(&session.kb, &state, "a trip to the museum", now)
        };
        let topics = extract_topics(&session.kb, "a trip to the museum");
        let prompt = session.build_system_prompt(&topics, &state).await.unwrap();

        assert!(prompt.contains("Current time of day:"));
        assert!(prompt.contains("Recent context:"));
        assert!(prompt.contains("Relevant knowledge:"));
        assert!(prompt.contains("name:Scarlett"));
    }

    #[tokio::test]
    async fn state_advances_on_each_turn() {
        let session = session_with_unreachable_backend();
        // how-did-x-die avoids the backend entirely.
        session.submit("how did van gogh die?".into()).await.unwrap();

        let state = session.state.lock().await;
        assert_eq!(state.last_topic.as_deref(), Some("artist_van_gogh"));
        assert!(!state.context_stack.is_empty());
    }
}
