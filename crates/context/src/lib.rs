//! # Hearth Context
//!
//! The conversational-context pipeline: a static knowledge base, pure
//! topic/importance/interest extraction, and the rolling
//! [`ConversationState`] updated once per turn to condition future prompts.

pub mod extract;
pub mod knowledge;
pub mod state;

pub use extract::{ART_CULTURE, calculate_importance, extract_interests, extract_topics};
pub use knowledge::{Artist, Death, KnowledgeBase, KnowledgeError, Topic};
pub use state::{
    CONTEXT_STACK_CAP, CappedSet, ContextEntry, ConversationState, INTERESTS_CAP, Preferences,
    RECENT_TOPICS_CAP, knowledge_context, prepare_context_info, specific_answer, time_context,
    update,
};
