//! The conversational context state machine.
//!
//! [`ConversationState`] is a value: each user message produces a new state
//! via the pure [`update`] transition (old state is read-only input), and
//! the caller replaces its held reference. Updates are strictly sequential,
//! one per turn — sequencing happens before the outbound request, not via
//! locking.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{calculate_importance, extract_interests, extract_topics};
use crate::knowledge::KnowledgeBase;

/// Bound on the topic/importance history used to condition prompts.
pub const CONTEXT_STACK_CAP: usize = 5;
/// Bound on the rolling recent-topic window.
pub const RECENT_TOPICS_CAP: usize = 3;
/// Bound on accumulated user interests.
pub const INTERESTS_CAP: usize = 5;

/// An insertion-ordered, deduplicated sequence with a fixed cap,
/// most-recent-first. New entries take priority over old on collision at
/// the truncation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappedSet {
    items: Vec<String>,
    cap: usize,
}

impl CappedSet {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            cap,
        }
    }

    /// Merge newer entries ahead of the existing ones: union preserving
    /// first occurrence, truncated to the cap.
    pub fn merge_front(&mut self, newer: &[String]) {
        let mut merged: Vec<String> = Vec::with_capacity(self.cap);
        for item in newer.iter().chain(self.items.iter()) {
            if !merged.contains(item) {
                merged.push(item.clone());
            }
            if merged.len() == self.cap {
                break;
            }
        }
        self.items = merged;
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }
}

/// One entry in the bounded context stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    /// Importance on the 1–5 scale.
    pub importance: u8,
    /// The raw message that produced this entry.
    pub source_text: String,
}

/// Accumulated user preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub interests: CappedSet,
    pub last_mentioned: DateTime<Utc>,
}

/// Rolling conversational state, superseded wholesale on each turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Recent topic window, most-recent-first, capped at 3.
    pub recent_topics: CappedSet,

    /// Topic/importance history, oldest first, FIFO-evicted past 5 entries.
    pub context_stack: Vec<ContextEntry>,

    pub preferences: Preferences,

    pub last_topic: Option<String>,

    pub last_interaction: DateTime<Utc>,
}

impl ConversationState {
    /// Empty defaults — created once at process start.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            recent_topics: CappedSet::new(RECENT_TOPICS_CAP),
            context_stack: Vec::new(),
            preferences: Preferences {
                interests: CappedSet::new(INTERESTS_CAP),
                last_mentioned: now,
            },
            last_topic: None,
            last_interaction: now,
        }
    }
}

/// Apply one turn's update, producing the successor state.
///
/// Steps, in order: topic extraction feeding `last_topic` and the context
/// stack (strict FIFO eviction), recent-topic recomputation, interest
/// extraction. A message with no topics leaves `last_topic` and the stack
/// untouched, but interests are still extracted independently.
pub fn update(
    kb: &KnowledgeBase,
    state: &ConversationState,
    message: &str,
    now: DateTime<Utc>,
) -> ConversationState {
    // Timestamps never move backwards across turns.
    let now = now.max(state.last_interaction);
    let mut next = state.clone();

    let topics = extract_topics(kb, message);
    if !topics.is_empty() {
        next.last_topic = Some(topics[0].clone());
        next.context_stack.push(ContextEntry {
            topic: topics[0].clone(),
            timestamp: now,
            importance: calculate_importance(message),
            source_text: message.to_string(),
        });
        if next.context_stack.len() > CONTEXT_STACK_CAP {
            next.context_stack.remove(0);
        }
        next.recent_topics.merge_front(&topics);
    }

    let interests = extract_interests(message);
    if !interests.is_empty() {
        next.preferences.interests.merge_front(&interests);
        next.preferences.last_mentioned = now;
    }

    next.last_interaction = now;
    next
}

/// Render knowledge base detail for the extracted topics.
///
/// Artist topics resolve to `"{name}: {details}"`, plain topics to their
/// contextual summary; missing keys are silently skipped. Joined with
/// a period-space separator, in input order.
pub fn knowledge_context(kb: &KnowledgeBase, topics: &[String]) -> String {
    let mut contexts: Vec<String> = Vec::new();

    for topic in topics {
        if let Some(artist_key) = topic.strip_prefix("artist_")
            && let Some(artist) = kb.artist(artist_key)
        {
            contexts.push(format!("{}: {}", artist.name, artist.details));
        }
        if let Some(data) = kb.topic(topic) {
            contexts.push(data.context.clone());
        }
    }

    contexts.join(". ")
}

/// Render the last two context stack entries as a prompt-conditioning
/// fragment. Not persisted.
pub fn prepare_context_info(state: &ConversationState, now: DateTime<Utc>) -> String {
    if state.context_stack.is_empty() {
        return "Starting fresh conversation".to_string();
    }

    let start = state.context_stack.len().saturating_sub(2);
    let recent: Vec<String> = state.context_stack[start..]
        .iter()
        .map(|entry| {
            let mins_ago = (now - entry.timestamp).num_minutes().max(0);
            format!(
                "Topic: {} ({} mins ago, importance: {})",
                entry.topic, mins_ago, entry.importance
            )
        })
        .collect();

    format!("Recent context: {}", recent.join(", "))
}

/// Answer a specific factual question directly from the knowledge base,
/// bypassing the model. Currently covers artist death questions.
pub fn specific_answer(kb: &KnowledgeBase, message: &str, topics: &[String]) -> Option<String> {
    let lower = message.to_lowercase();
    if !lower.contains("death") && !lower.contains("die") {
        return None;
    }

    topics
        .iter()
        .filter_map(|t| t.strip_prefix("artist_"))
        .filter_map(|key| kb.artist(key))
        .find_map(|artist| artist.death.as_ref().map(|d| d.details.clone()))
}

/// Coarse time-of-day label for prompt flavor.
pub fn time_context(now: DateTime<Utc>) -> &'static str {
    match now.hour() {
        5..12 => "Morning",
        12..17 => "Afternoon",
        17..22 => "Evening",
        _ => "Night",
    }
}
