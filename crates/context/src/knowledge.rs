//! The static knowledge base — artists and topics the companion can draw on.
//!
//! Loaded once at process start from a JSON file (path in config) or from
//! built-in defaults, and immutable for the process lifetime. Safe to share
//! across tasks without synchronization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An artist entry: descriptive text plus optional death details that
/// answer "how did X die?" style questions directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death: Option<Death>,
    #[serde(default)]
    pub works: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Death {
    pub year: i32,
    pub cause: String,
    pub details: String,
}

/// A topic entry: trigger terms plus a contextual summary for prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default)]
    pub related: Vec<String>,
    pub context: String,
}

/// The knowledge base. BTreeMap keeps scan order deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub artists: BTreeMap<String, Artist>,
    #[serde(default)]
    pub topics: BTreeMap<String, Topic>,
}

impl KnowledgeBase {
    /// Load from a JSON file when a path is given, built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, KnowledgeError> {
        match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| KnowledgeError::ReadError {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                let kb: Self =
                    serde_json::from_str(&content).map_err(|e| KnowledgeError::ParseError {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                tracing::info!(
                    artists = kb.artists.len(),
                    topics = kb.topics.len(),
                    "Knowledge base loaded from {}",
                    path.display()
                );
                Ok(kb)
            }
            None => Ok(Self::builtin()),
        }
    }

    /// The built-in knowledge base used when no file is configured.
    pub fn builtin() -> Self {
        let mut artists = BTreeMap::new();
        artists.insert(
            "van_gogh".to_string(),
            Artist {
                name: "Vincent van Gogh".into(),
                details: "Dutch Post-Impressionist painter known for bold colors and \
                          expressive brushwork"
                    .into(),
                death: Some(Death {
                    year: 1890,
                    cause: "gunshot wound".into(),
                    details: "Vincent van Gogh died in 1890 at age 37, two days after a \
                              gunshot wound generally believed to be self-inflicted, in \
                              Auvers-sur-Oise, France."
                        .into(),
                }),
                works: vec![
                    "The Starry Night".into(),
                    "Sunflowers".into(),
                    "Café Terrace at Night".into(),
                ],
                facts: vec![
                    "Sold only one painting during his lifetime".into(),
                    "Created over 2,000 artworks in about a decade".into(),
                ],
            },
        );
        artists.insert(
            "frida_kahlo".to_string(),
            Artist {
                name: "Frida Kahlo".into(),
                details: "Mexican painter famous for striking self-portraits and \
                          vivid symbolism"
                    .into(),
                death: None,
                works: vec!["The Two Fridas".into(), "Self-Portrait with Thorn Necklace".into()],
                facts: vec!["Her home, La Casa Azul, is now a museum".into()],
            },
        );

        let mut topics = BTreeMap::new();
        topics.insert(
            "art".to_string(),
            Topic {
                related: vec![
                    "painting".into(),
                    "museum".into(),
                    "artist".into(),
                    "gallery".into(),
                    "culture".into(),
                ],
                context: "Art and cultural topics — painting, museums, and exhibitions".into(),
            },
        );
        topics.insert(
            "astronomy".to_string(),
            Topic {
                related: vec![
                    "star".into(),
                    "observatory".into(),
                    "telescope".into(),
                    "planet".into(),
                    "space".into(),
                ],
                context: "Astronomy and the night sky — stargazing and observatories".into(),
            },
        );

        Self { artists, topics }
    }

    pub fn artist(&self, key: &str) -> Option<&Artist> {
        self.artists.get(key)
    }

    pub fn topic(&self, key: &str) -> Option<&Topic> {
        self.topics.get(key)
    }
}

/// Knowledge base loading errors.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge base at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse knowledge base at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_van_gogh() {
        let kb = KnowledgeBase::builtin();
        let artist = kb.artist("van_gogh").unwrap();
        assert_eq!(artist.name, "Vincent van Gogh");
        assert!(artist.death.is_some());
    }

    #[test]
    fn builtin_topics_have_triggers() {
        let kb = KnowledgeBase::builtin();
        let art = kb.topic("art").unwrap();
        assert!(art.related.iter().any(|t| t == "museum"));
    }

    #[test]
    fn load_without_path_uses_builtin() {
        let kb = KnowledgeBase::load(None).unwrap();
        assert!(!kb.artists.is_empty());
    }

    #[test]
    fn load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"{
                "artists": {
                    "example_artist": {
                        "name": "Example Artist",
                        "details": "Famous artist details",
                        "works": ["Work 1"],
                        "facts": ["Fact 1"]
                    }
                },
                "topics": {
                    "art": {
                        "related": ["painting", "museum"],
                        "context": "Art and cultural topics"
                    }
                }
            }"#,
        )
        .unwrap();

        let kb = KnowledgeBase::load(Some(&path)).unwrap();
        assert_eq!(kb.artist("example_artist").unwrap().name, "Example Artist");
        assert_eq!(kb.topic("art").unwrap().related.len(), 2);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            KnowledgeBase::load(Some(&path)),
            Err(KnowledgeError::ParseError { .. })
        ));
    }
}
