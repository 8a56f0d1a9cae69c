//! Topic, importance, and interest extraction.
//!
//! Pure functions over the raw message text. Substring matching is
//! deliberately loose (case-insensitive `contains`) — absence of matches is
//! an empty result, never an error.

use crate::knowledge::KnowledgeBase;

/// Synthetic tag produced by the fixed art/culture keyword triggers.
pub const ART_CULTURE: &str = "art_culture";

const ART_CULTURE_TRIGGERS: [&str; 4] = ["art", "museum", "painting", "book"];

/// Extract topic tags from a message.
///
/// Matches, case-insensitively:
/// - artist keys (underscores normalized to spaces) → `artist_<key>`
/// - topics with a matching related term → the topic key
/// - the fixed art/culture triggers → [`ART_CULTURE`], checked last
///
/// Deduplicated; order is the knowledge base scan order plus the synthetic
/// check at the end.
pub fn extract_topics(kb: &KnowledgeBase, message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut topics: Vec<String> = Vec::new();

    for key in kb.artists.keys() {
        if lower.contains(&key.replace('_', " ")) {
            push_unique(&mut topics, format!("artist_{key}"));
        }
    }

    for (key, topic) in &kb.topics {
        if topic.related.iter().any(|term| lower.contains(term.as_str())) {
            push_unique(&mut topics, key.clone());
        }
    }

    if ART_CULTURE_TRIGGERS.iter().any(|t| lower.contains(t)) {
        push_unique(&mut topics, ART_CULTURE.to_string());
    }

    topics
}

/// Score a message's importance on a 1–5 scale.
///
/// Base 1; +2 for emotionally salient terms, +1 for first-person markers,
/// +1 for a question mark; clamped to 5.
pub fn calculate_importance(message: &str) -> u8 {
    let lower = message.to_lowercase();
    let mut importance: u8 = 1;

    if lower.contains("love") || lower.contains("miss") {
        importance += 2;
    }
    if lower.contains("my") || lower.contains('i') {
        importance += 1;
    }
    if message.contains('?') {
        importance += 1;
    }

    importance.min(5)
}

/// Extract interest tags into the fixed taxonomy.
pub fn extract_interests(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut interests = Vec::new();

    if ["van gogh", "art", "painting", "museum"]
        .iter()
        .any(|t| lower.contains(t))
    {
        interests.push("fine_arts".to_string());
    }

    if ["star", "observatory", "space", "science"]
        .iter()
        .any(|t| lower.contains(t))
    {
        interests.push("astronomy".to_string());
    }

    interests
}

fn push_unique(topics: &mut Vec<String>, topic: String) {
    if !topics.contains(&topic) {
        topics.push(topic);
    }
}
