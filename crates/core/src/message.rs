//! Chat message domain types.
//!
//! These are the core value objects that flow through the system:
//! the user submits a message → the gateway updates conversational context →
//! the backend streams a response → the finalized message is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI companion
    Assistant,
    /// System instructions (persona, rules)
    System,
}

/// Severity tag for messages that represent degraded states.
///
/// Backend failures are surfaced to the conversation as assistant-role
/// entries tagged `Error` rather than crashing the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// A persisted chat message record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Soft-delete flag — deleted messages are excluded from listings
    /// but retained by the store.
    #[serde(default)]
    pub is_deleted: bool,

    /// Starred by the user
    #[serde(default)]
    pub is_starred: bool,

    /// Set on inline error notices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl ChatMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant-role error notice for inline display.
    pub fn error_notice(content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.severity = Some(Severity::Error);
        msg
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_deleted: false,
            is_starred: false,
            severity: None,
        }
    }
}

/// The single in-flight assistant message being assembled from a stream.
///
/// Content is append-only while the turn is open; `finalize` transitions
/// the message to its immutable, persistable form exactly once. At most
/// one `StreamingMessage` is open per conversation — enforced by the
/// [`crate::turn::TurnGuard`], not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingMessage {
    /// Opaque identifier assigned at turn start
    pub id: String,

    /// Always `Assistant` for model output; kept explicit so replays of
    /// user input through the same plumbing stay honest.
    pub role: Role,

    /// Accumulating text, monotonically append-only during the turn
    pub content: String,

    /// Becomes true exactly once, at end-of-stream
    finalized: bool,
}

impl StreamingMessage {
    /// Open a new in-flight assistant message.
    pub fn open() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: String::new(),
            finalized: false,
        }
    }

    /// Append a decoded content fragment. Fragments arriving after
    /// finalization are dropped (the stream has already ended).
    pub fn append(&mut self, fragment: &str) {
        if self.finalized {
            tracing::warn!(id = %self.id, "fragment after finalization dropped");
            return;
        }
        self.content.push_str(fragment);
    }

    /// Whether the message has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Mark the message finalized and convert it to a persistable record.
    ///
    /// Consumes `self`, so a second finalization is unrepresentable.
    pub fn finalize(mut self) -> ChatMessage {
        self.finalized = true;
        ChatMessage {
            id: self.id,
            role: self.role,
            content: self.content,
            timestamp: Utc::now(),
            is_deleted: false,
            is_starred: false,
            severity: None,
        }
    }
}
